//! Canonical data model for member records, role records, and the persisted
//! aggregate that holds one snapshot per upstream source.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One upstream data provider, or the user-edit layer.
///
/// The order sources are consulted in is fixed per operation and spelled out
/// where it matters ([`crate::resolve`]); this enum only tags data with its
/// origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// The congressional biographical directory (per-member fetch).
    Bioguide,
    /// GovTrack's person/role API (per-member fetch).
    Govtrack,
    /// The unitedstates legislators bulk dataset (whole-dataset fetch).
    Unitedstates,
    /// Human-curated overrides entered through the API layer.
    UserEdits,
}

impl Source {
    /// Stable lowercase label used in log fields.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bioguide => "bioguide",
            Self::Govtrack => "govtrack",
            Self::Unitedstates => "unitedstates",
            Self::UserEdits => "user_edits",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Lowercase label; `Unknown` maps to the empty string so gender can run
    /// through the same empty-means-absent merge rule as every other scalar.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "",
        }
    }

    /// Lenient parse accepting the spellings the upstreams use
    /// (`M`/`F`, `male`/`female`, `Male`/`Female`).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Self::Male,
            "f" | "female" => Self::Female,
            _ => Self::Unknown,
        }
    }
}

/// Biographical scalar attributes for one member, as reported by one source.
///
/// All string fields use the empty string for "not reported"; merge logic
/// treats empty as absent throughout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Provider-stable bioguide identifier, e.g. `"S000622"`.
    pub id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub suffix: String,
    pub nickname: String,
    /// ASCII-folded name variants carried by the biographical directory.
    pub unaccented_first_name: String,
    pub unaccented_last_name: String,
    pub gender: Gender,
    /// Canonical date string, possibly partial-filled (see [`crate::dates`]).
    pub birthday: String,
    pub website: String,
    pub office: String,
    pub phone: String,
    pub twitter: String,
    pub facebook: String,
    pub youtube: String,
    /// Epoch millis of the last successful sync from this source; 0 = never.
    #[serde(default)]
    pub update_timestamp: i64,
    /// Consecutive failed sync attempts since the last success.
    #[serde(default)]
    pub fail_count: u32,
}

impl MemberRecord {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    Senate,
    House,
}

impl Chamber {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Senate => "senate",
            Self::House => "house",
        }
    }
}

/// One party affiliation span inside a role. Insertion order is chronological
/// as discovered; spans are never deduplicated across sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySpan {
    pub party: String,
    pub start_date: String,
    pub end_date: String,
}

/// One legislative term or assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Congress numbers covered; size 1 as reported, larger only after merge.
    pub congress_numbers: BTreeSet<u16>,
    pub chamber: Chamber,
    /// Canonical date strings, never empty (open bounds use the sentinels).
    pub start_date: String,
    pub end_date: String,
    pub parties: Vec<PartySpan>,
    /// Region code, e.g. `"TN"`. Empty = not reported.
    pub state: String,
    /// Senate only.
    pub senator_class: Option<u8>,
    /// House only.
    pub district: Option<u16>,
}

/// The last-merged record + role list attributed to one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub record: MemberRecord,
    pub roles: Vec<RoleRecord>,
}

/// A scalar field where a user override disagrees with what the upstream
/// sources merged to. The synced value is preserved so the disagreement stays
/// visible even though the override wins in the projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideConflict {
    pub field: String,
    pub override_value: String,
    pub synced_value: String,
}

/// The persisted entity: one member, four per-source snapshots, and the
/// derived outward projection.
///
/// The projection fields are recomputed on every sync cycle and must never be
/// edited directly; user edits go through the [`Source::UserEdits`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAggregate {
    pub id: String,
    pub bioguide: Snapshot,
    pub govtrack: Snapshot,
    pub unitedstates: Snapshot,
    pub user: Snapshot,
    /// Derived outward-facing record (see [`crate::resolve`]).
    pub projection: MemberRecord,
    pub projection_roles: Vec<RoleRecord>,
    pub override_conflicts: Vec<OverrideConflict>,
    #[serde(default)]
    pub profile_picture_uri: String,
    #[serde(default)]
    pub picture_fail_count: u32,
}

impl MemberAggregate {
    /// Fresh aggregate with empty snapshots, created on first reference to an
    /// id. There is no deletion path; aggregates persist indefinitely.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            bioguide: Snapshot::default(),
            govtrack: Snapshot::default(),
            unitedstates: Snapshot::default(),
            user: Snapshot::default(),
            projection: MemberRecord::new(id.clone()),
            projection_roles: Vec::new(),
            override_conflicts: Vec::new(),
            profile_picture_uri: String::new(),
            picture_fail_count: 0,
            id,
        }
    }

    /// Read access to one source's snapshot.
    #[must_use]
    pub const fn snapshot(&self, source: Source) -> &Snapshot {
        match source {
            Source::Bioguide => &self.bioguide,
            Source::Govtrack => &self.govtrack,
            Source::Unitedstates => &self.unitedstates,
            Source::UserEdits => &self.user,
        }
    }

    /// Mutable access to one source's snapshot. Each snapshot is owned by its
    /// source's adapter+merge step; cross-source resolution only reads.
    pub const fn snapshot_mut(&mut self, source: Source) -> &mut Snapshot {
        match source {
            Source::Bioguide => &mut self.bioguide,
            Source::Govtrack => &mut self.govtrack,
            Source::Unitedstates => &mut self.unitedstates,
            Source::UserEdits => &mut self.user,
        }
    }
}
