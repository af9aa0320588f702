//! Reconciliation engine for Congress member records.
//!
//! Pure logic only: normalizing partial dates, merging scalar fields under
//! per-source precedence, reconciling legislative-role intervals, and
//! resolving the per-source snapshots into one outward projection. All I/O
//! (upstream fetches, persistence) lives in the `legisync-api` service crate.

pub mod dates;
pub mod fields;
pub mod model;
pub mod resolve;
pub mod roles;
