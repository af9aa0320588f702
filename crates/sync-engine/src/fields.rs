//! Scalar field merge under per-source precedence policy.
//!
//! [`merge_member`] walks every biographical scalar on a [`MemberRecord`] and
//! applies one source's freshly fetched values to the target snapshot. The
//! decision rule is value-agnostic except for one source-policy special case:
//! user edits are additive-only, so an empty incoming value from
//! [`Source::UserEdits`] never clears an existing one.
//!
//! Every effective change is returned as a [`FieldChange`] and emitted as a
//! structured tracing event; that change log is the only externally
//! observable side effect of this step.

use serde::Serialize;
use tracing::debug;

use crate::model::{Gender, MemberRecord, Source};

/// How an effective field update is classified in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Old value was empty.
    Added,
    /// New value is empty.
    Removed,
    /// Both present, different.
    Changed,
}

impl ChangeKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        }
    }
}

/// One effective scalar update applied during a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub kind: ChangeKind,
    pub old: String,
    pub new: String,
}

/// Whether an incoming value should replace the current one.
///
/// Source-policy, not value-policy: identical inputs under a different source
/// tag can only diverge through the `UserEdits` additive-only rule.
#[must_use]
pub fn needs_update(source: Source, old: &str, new: &str) -> bool {
    if source == Source::UserEdits && new.is_empty() {
        return false;
    }
    old != new
}

/// Merge one source's scalar attributes into a target record, returning the
/// effective changes. Identity and sync bookkeeping (`id`,
/// `update_timestamp`, `fail_count`) are never touched here.
pub fn merge_member(
    source: Source,
    target: &mut MemberRecord,
    incoming: &MemberRecord,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    macro_rules! merge_field {
        ($field:ident) => {
            apply(
                source,
                stringify!($field),
                &mut target.$field,
                &incoming.$field,
                &mut changes,
            );
        };
    }

    merge_field!(first_name);
    merge_field!(middle_name);
    merge_field!(last_name);
    merge_field!(suffix);
    merge_field!(nickname);
    merge_field!(unaccented_first_name);
    merge_field!(unaccented_last_name);
    merge_field!(birthday);
    merge_field!(website);
    merge_field!(office);
    merge_field!(phone);
    merge_field!(twitter);
    merge_field!(facebook);
    merge_field!(youtube);

    // Gender runs through the same rule on its string label so the
    // additive-only policy holds for enums too.
    let mut gender = target.gender.as_str().to_owned();
    apply(
        source,
        "gender",
        &mut gender,
        incoming.gender.as_str(),
        &mut changes,
    );
    target.gender = Gender::parse(&gender);

    changes
}

fn apply(
    source: Source,
    field: &'static str,
    old: &mut String,
    new: &str,
    changes: &mut Vec<FieldChange>,
) {
    if !needs_update(source, old, new) {
        return;
    }

    let kind = if old.is_empty() {
        ChangeKind::Added
    } else if new.is_empty() {
        ChangeKind::Removed
    } else {
        ChangeKind::Changed
    };

    debug!(
        source = source.label(),
        field,
        kind = kind.label(),
        old = old.as_str(),
        new,
        "member field updated"
    );

    changes.push(FieldChange {
        field,
        kind,
        old: std::mem::replace(old, new.to_owned()),
        new: new.to_owned(),
    });
}
