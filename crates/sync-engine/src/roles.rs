//! Legislative-role interval reconciliation.
//!
//! Two merge shapes exist:
//!
//! - [`resync_same_source`]: a freshly fetched role list from one structured
//!   source is matched against the existing snapshot list from that same
//!   source by exact start date. The upstream is authoritative for
//!   completeness, so snapshot roles it no longer reports are dropped.
//! - [`bucket_merge`]: role lists from independent sources are grouped into
//!   buckets by interval overlap and each bucket collapses to one role. A
//!   record joins the first bucket it overlaps (first-fit, deliberately not
//!   best-fit; changing that would reshuffle historical output).
//!
//! Combining two roles is guarded by consistency checks; a failed check keeps
//! both roles separate and records a [`RoleConflict`] instead of failing the
//! merge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dates::{OPEN_END, OPEN_START};
use crate::model::{Chamber, RoleRecord};

/// A combined role may not span more congresses than this; a wider union
/// means the overlap was coincidental, not the same underlying term.
pub const MAX_CONGRESS_SPAN: usize = 3;

/// Why two overlapping/matched roles were left uncombined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleConflict {
    ChamberMismatch {
        left: Chamber,
        right: Chamber,
    },
    AttributeMismatch {
        field: String,
        left: String,
        right: String,
    },
    CongressSpanTooWide {
        congresses: Vec<u16>,
    },
}

/// Party-span handling when two roles combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartyMerge {
    /// Cross-source bucketing: concatenate, no dedup.
    Concat,
    /// Same-source resync: the fresh fetch is the truth for its spans.
    TakeIncoming,
}

/// A role is merge input only when its canonical interval is ordered and
/// neither bound is fully open.
#[must_use]
pub fn well_formed(role: &RoleRecord) -> bool {
    role.start_date <= role.end_date && role.start_date != OPEN_START && role.end_date != OPEN_END
}

/// Closed-interval overlap on canonical date strings. A term ending exactly
/// where the next begins (the Jan 3 handover) counts as overlapping so
/// consecutive terms collapse into one continuous service role.
#[must_use]
pub fn overlaps(a: &RoleRecord, b: &RoleRecord) -> bool {
    !(a.end_date < b.start_date || b.end_date < a.start_date)
}

fn combine(
    base: &RoleRecord,
    incoming: &RoleRecord,
    parties: PartyMerge,
) -> Result<RoleRecord, RoleConflict> {
    if base.chamber != incoming.chamber {
        return Err(RoleConflict::ChamberMismatch {
            left: base.chamber,
            right: incoming.chamber,
        });
    }
    if !base.state.is_empty() && !incoming.state.is_empty() && base.state != incoming.state {
        return Err(RoleConflict::AttributeMismatch {
            field: "state".into(),
            left: base.state.clone(),
            right: incoming.state.clone(),
        });
    }
    if let (Some(left), Some(right)) = (base.district, incoming.district) {
        if left != right {
            return Err(RoleConflict::AttributeMismatch {
                field: "district".into(),
                left: left.to_string(),
                right: right.to_string(),
            });
        }
    }
    if let (Some(left), Some(right)) = (base.senator_class, incoming.senator_class) {
        if left != right {
            return Err(RoleConflict::AttributeMismatch {
                field: "senator_class".into(),
                left: left.to_string(),
                right: right.to_string(),
            });
        }
    }

    let congress_numbers: BTreeSet<u16> = base
        .congress_numbers
        .union(&incoming.congress_numbers)
        .copied()
        .collect();
    if congress_numbers.len() > MAX_CONGRESS_SPAN {
        return Err(RoleConflict::CongressSpanTooWide {
            congresses: congress_numbers.into_iter().collect(),
        });
    }

    let merged_parties = match parties {
        PartyMerge::Concat => {
            let mut spans = base.parties.clone();
            spans.extend(incoming.parties.iter().cloned());
            spans
        }
        PartyMerge::TakeIncoming => incoming.parties.clone(),
    };

    Ok(RoleRecord {
        congress_numbers,
        chamber: base.chamber,
        start_date: base.start_date.clone().min(incoming.start_date.clone()),
        end_date: base.end_date.clone().max(incoming.end_date.clone()),
        parties: merged_parties,
        state: if base.state.is_empty() {
            incoming.state.clone()
        } else {
            base.state.clone()
        },
        senator_class: base.senator_class.or(incoming.senator_class),
        district: base.district.or(incoming.district),
    })
}

fn sort_roles(roles: &mut [RoleRecord]) {
    roles.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.end_date.cmp(&b.end_date))
    });
}

/// Match a fresh fetch from one structured source against that source's
/// existing snapshot list.
///
/// Matching is by exact start date, not interval overlap, because a source
/// can report multiple sequential terms starting on the same date; duplicate
/// start dates are consumed in order. Unmatched fetched roles are new;
/// unmatched snapshot roles are gone upstream and are dropped. The result is
/// a freshly built list, sorted by start date.
#[must_use]
pub fn resync_same_source(
    existing: &[RoleRecord],
    fetched: &[RoleRecord],
) -> (Vec<RoleRecord>, Vec<RoleConflict>) {
    let existing: Vec<&RoleRecord> = existing.iter().filter(|r| well_formed(r)).collect();
    let mut consumed = vec![false; existing.len()];

    let mut merged = Vec::new();
    let mut conflicts = Vec::new();

    for role in fetched.iter().filter(|r| well_formed(r)) {
        let slot = existing
            .iter()
            .enumerate()
            .find(|(i, e)| !consumed[*i] && e.start_date == role.start_date)
            .map(|(i, _)| i);

        match slot {
            Some(i) => {
                consumed[i] = true;
                match combine(existing[i], role, PartyMerge::TakeIncoming) {
                    Ok(combined) => merged.push(combined),
                    Err(conflict) => {
                        warn!(
                            start_date = role.start_date.as_str(),
                            conflict = ?conflict,
                            "resynced role inconsistent with snapshot; keeping both"
                        );
                        merged.push(existing[i].clone());
                        merged.push(role.clone());
                        conflicts.push(conflict);
                    }
                }
            }
            None => merged.push(role.clone()),
        }
    }

    sort_roles(&mut merged);
    (merged, conflicts)
}

/// Bucket role lists from independent sources by interval overlap and
/// collapse each bucket into one role.
///
/// `lists` is ordered by source precedence; later lists join buckets opened
/// by earlier ones. Each record lands in the first bucket it overlaps. When a
/// consistency check rejects the combination the record opens its own bucket
/// and the conflict is recorded. Output is a new list sorted by start date.
#[must_use]
pub fn bucket_merge(lists: &[&[RoleRecord]]) -> (Vec<RoleRecord>, Vec<RoleConflict>) {
    let mut buckets: Vec<RoleRecord> = Vec::new();
    let mut conflicts = Vec::new();

    for list in lists {
        for role in list.iter().filter(|r| well_formed(r)) {
            let hit = buckets.iter().position(|bucket| overlaps(bucket, role));
            match hit {
                Some(i) => match combine(&buckets[i], role, PartyMerge::Concat) {
                    Ok(combined) => buckets[i] = combined,
                    Err(conflict) => {
                        warn!(
                            start_date = role.start_date.as_str(),
                            conflict = ?conflict,
                            "overlapping roles cannot combine; keeping separate"
                        );
                        conflicts.push(conflict);
                        buckets.push(role.clone());
                    }
                },
                None => buckets.push(role.clone()),
            }
        }
    }

    sort_roles(&mut buckets);
    (buckets, conflicts)
}
