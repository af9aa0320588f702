//! Cross-source resolution: collapse the per-source snapshots into the one
//! outward-facing projection.
//!
//! Scalar precedence is Bioguide, then the unitedstates dataset, then
//! GovTrack. A later source only displaces the current answer when the
//! current answer is empty or the later value extends it as a string prefix
//! (a more complete version of the same value); any other disagreement is
//! recorded as a [`ScalarConflict`] and the earlier-ranked value kept.
//!
//! A non-empty user edit always wins in the projection, but the merged
//! upstream value is preserved in an [`OverrideConflict`] whenever the two
//! disagree, so synced data drifting under an override stays visible.
//!
//! Role periods are combined with the first-fit interval bucketing of
//! [`crate::roles::bucket_merge`], precedence GovTrack, unitedstates,
//! Bioguide.
//!
//! Resolution only reads the snapshots; it never mutates them.

use serde::Serialize;
use tracing::{info, warn};

use crate::model::{Gender, MemberRecord, OverrideConflict, RoleRecord, Snapshot, Source};
use crate::roles::{bucket_merge, RoleConflict};

/// Two upstream sources disagreeing on a scalar; the earlier-ranked value was
/// kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScalarConflict {
    pub field: &'static str,
    pub kept_source: Source,
    pub kept_value: String,
    pub source: Source,
    pub value: String,
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub projection: MemberRecord,
    pub roles: Vec<RoleRecord>,
    pub scalar_conflicts: Vec<ScalarConflict>,
    pub override_conflicts: Vec<OverrideConflict>,
    pub role_conflicts: Vec<RoleConflict>,
}

/// Resolve the four snapshots into a projection for `id`.
#[must_use]
pub fn resolve(
    id: &str,
    bioguide: &Snapshot,
    govtrack: &Snapshot,
    unitedstates: &Snapshot,
    user: &Snapshot,
) -> Resolution {
    let mut projection = MemberRecord::new(id);
    let mut scalar_conflicts = Vec::new();
    let mut override_conflicts = Vec::new();

    macro_rules! resolve_field {
        ($field:ident) => {
            projection.$field = resolve_scalar(
                stringify!($field),
                [
                    (Source::Bioguide, bioguide.record.$field.as_str()),
                    (Source::Unitedstates, unitedstates.record.$field.as_str()),
                    (Source::Govtrack, govtrack.record.$field.as_str()),
                ],
                user.record.$field.as_str(),
                &mut scalar_conflicts,
                &mut override_conflicts,
            );
        };
    }

    resolve_field!(first_name);
    resolve_field!(middle_name);
    resolve_field!(last_name);
    resolve_field!(suffix);
    resolve_field!(nickname);
    resolve_field!(unaccented_first_name);
    resolve_field!(unaccented_last_name);
    resolve_field!(birthday);
    resolve_field!(website);
    resolve_field!(office);
    resolve_field!(phone);
    resolve_field!(twitter);
    resolve_field!(facebook);
    resolve_field!(youtube);

    projection.gender = Gender::parse(&resolve_scalar(
        "gender",
        [
            (Source::Bioguide, bioguide.record.gender.as_str()),
            (Source::Unitedstates, unitedstates.record.gender.as_str()),
            (Source::Govtrack, govtrack.record.gender.as_str()),
        ],
        user.record.gender.as_str(),
        &mut scalar_conflicts,
        &mut override_conflicts,
    ));

    // User edits never contribute role periods.
    let (roles, role_conflicts) = bucket_merge(&[
        govtrack.roles.as_slice(),
        unitedstates.roles.as_slice(),
        bioguide.roles.as_slice(),
    ]);

    Resolution {
        projection,
        roles,
        scalar_conflicts,
        override_conflicts,
        role_conflicts,
    }
}

/// Merge one scalar across the ranked upstream values, then apply the user
/// override on top.
fn resolve_scalar(
    field: &'static str,
    ranked: [(Source, &str); 3],
    override_value: &str,
    scalar_conflicts: &mut Vec<ScalarConflict>,
    override_conflicts: &mut Vec<OverrideConflict>,
) -> String {
    let mut kept_source = ranked[0].0;
    let mut merged = String::new();

    for (source, value) in ranked {
        if value.is_empty() {
            continue;
        }
        if merged.is_empty() {
            merged = value.to_owned();
            kept_source = source;
            continue;
        }
        if value == merged {
            continue;
        }
        if value.starts_with(&merged) {
            // More complete version of the same value; upgrade silently.
            merged = value.to_owned();
            kept_source = source;
            continue;
        }
        warn!(
            field,
            kept_source = kept_source.label(),
            kept = merged.as_str(),
            source = source.label(),
            value,
            "sources disagree on member field"
        );
        scalar_conflicts.push(ScalarConflict {
            field,
            kept_source,
            kept_value: merged.clone(),
            source,
            value: value.to_owned(),
        });
    }

    if override_value.is_empty() {
        return merged;
    }
    if override_value != merged && !merged.is_empty() {
        info!(
            field,
            override_value,
            synced = merged.as_str(),
            "user override conflicts with synced data"
        );
        override_conflicts.push(OverrideConflict {
            field: field.to_owned(),
            override_value: override_value.to_owned(),
            synced_value: merged,
        });
    }
    override_value.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chamber, PartySpan};

    fn snapshot_with(first_name: &str) -> Snapshot {
        let mut snap = Snapshot::default();
        snap.record.first_name = first_name.into();
        snap
    }

    fn role(chamber: Chamber, start: &str, end: &str, congress: u16) -> RoleRecord {
        RoleRecord {
            congress_numbers: [congress].into_iter().collect(),
            chamber,
            start_date: start.into(),
            end_date: end.into(),
            parties: vec![PartySpan {
                party: "Democrat".into(),
                start_date: start.into(),
                end_date: end.into(),
            }],
            state: "NJ".into(),
            senator_class: Some(2),
            district: None,
        }
    }

    #[test]
    fn earlier_ranked_source_wins_and_conflict_is_recorded() {
        let bioguide = snapshot_with("John");
        let govtrack = snapshot_with("Jon");

        let resolution = resolve(
            "S000622",
            &bioguide,
            &govtrack,
            &Snapshot::default(),
            &Snapshot::default(),
        );

        assert_eq!(resolution.projection.first_name, "John");
        assert_eq!(resolution.scalar_conflicts.len(), 1);
        let conflict = &resolution.scalar_conflicts[0];
        assert_eq!(conflict.field, "first_name");
        assert_eq!(conflict.kept_source, Source::Bioguide);
        assert_eq!(conflict.source, Source::Govtrack);
        assert_eq!(conflict.value, "Jon");
    }

    #[test]
    fn prefix_extension_upgrades_without_conflict() {
        let bioguide = snapshot_with("J.");
        let unitedstates = snapshot_with("J. Robert");

        let resolution = resolve(
            "O000000",
            &bioguide,
            &Snapshot::default(),
            &unitedstates,
            &Snapshot::default(),
        );

        assert_eq!(resolution.projection.first_name, "J. Robert");
        assert!(resolution.scalar_conflicts.is_empty());
    }

    #[test]
    fn empty_earlier_source_defers_to_later() {
        let govtrack = snapshot_with("Jon");

        let resolution = resolve(
            "S000622",
            &Snapshot::default(),
            &govtrack,
            &Snapshot::default(),
            &Snapshot::default(),
        );

        assert_eq!(resolution.projection.first_name, "Jon");
        assert!(resolution.scalar_conflicts.is_empty());
    }

    #[test]
    fn override_wins_and_preserves_synced_value() {
        let bioguide = snapshot_with("John");
        let user = snapshot_with("X");

        let resolution = resolve(
            "S000622",
            &bioguide,
            &Snapshot::default(),
            &Snapshot::default(),
            &user,
        );

        assert_eq!(resolution.projection.first_name, "X");
        assert_eq!(
            resolution.override_conflicts,
            vec![OverrideConflict {
                field: "first_name".into(),
                override_value: "X".into(),
                synced_value: "John".into(),
            }]
        );
    }

    #[test]
    fn override_matching_synced_value_is_not_a_conflict() {
        let bioguide = snapshot_with("John");
        let user = snapshot_with("John");

        let resolution = resolve(
            "S000622",
            &bioguide,
            &Snapshot::default(),
            &Snapshot::default(),
            &user,
        );

        assert_eq!(resolution.projection.first_name, "John");
        assert!(resolution.override_conflicts.is_empty());
    }

    #[test]
    fn override_on_unsynced_field_is_not_a_conflict() {
        let user = snapshot_with("X");

        let resolution = resolve(
            "S000622",
            &Snapshot::default(),
            &Snapshot::default(),
            &Snapshot::default(),
            &user,
        );

        assert_eq!(resolution.projection.first_name, "X");
        assert!(resolution.override_conflicts.is_empty());
    }

    #[test]
    fn roles_bucket_across_sources_user_excluded() {
        let mut govtrack = Snapshot::default();
        govtrack.roles = vec![role(Chamber::Senate, "2019-01-03", "2021-01-03", 116)];
        let mut bioguide = Snapshot::default();
        bioguide.roles = vec![role(Chamber::Senate, "2021-01-03", "2023-01-03", 117)];
        let mut user = Snapshot::default();
        user.roles = vec![role(Chamber::House, "1999-01-03", "2001-01-03", 106)];

        let resolution = resolve("B001288", &bioguide, &govtrack, &Snapshot::default(), &user);

        assert_eq!(resolution.roles.len(), 1);
        assert_eq!(resolution.roles[0].start_date, "2019-01-03");
        assert_eq!(resolution.roles[0].end_date, "2023-01-03");
        assert!(resolution.role_conflicts.is_empty());
    }

    #[test]
    fn gender_resolves_through_ranking() {
        let mut govtrack = Snapshot::default();
        govtrack.record.gender = Gender::Female;

        let resolution = resolve(
            "C000127",
            &Snapshot::default(),
            &govtrack,
            &Snapshot::default(),
            &Snapshot::default(),
        );

        assert_eq!(resolution.projection.gender, Gender::Female);
    }
}
