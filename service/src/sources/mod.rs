//! Upstream source adapters.
//!
//! Each adapter fetches raw data for one member from one upstream provider
//! and maps it into the engine's common `(MemberRecord, Vec<RoleRecord>)`
//! shape, normalizing every date on the way in. Adapters are stateless except
//! for the shared bulk-dataset cache used by the legislators adapter.
//!
//! The providers:
//!
//! - [`BioguideAdapter`] — the congressional biographical directory,
//!   per-member JSON fetch.
//! - [`GovtrackAdapter`] — GovTrack's person/role API, per-member fetch.
//! - [`UnitedstatesAdapter`] — the unitedstates legislators bulk dataset,
//!   fetched whole and cached for 24 hours in a [`DatasetCache`].
//!
//! User overrides are not an adapter; they arrive as an
//! [`crate::sync::OverridePayload`] and merge through the engine's
//! user-edit policy.

mod bioguide;
mod govtrack;
mod transport;
mod unitedstates;

use legisync_engine::model::{MemberRecord, RoleRecord, Source};

pub use bioguide::BioguideAdapter;
pub use govtrack::GovtrackAdapter;
pub use transport::{HttpTransport, SourceTransport, TransportError};
pub use unitedstates::{DatasetCache, UnitedstatesAdapter};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::mock;

/// One member's data as reported by one upstream, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMember {
    pub record: MemberRecord,
    pub roles: Vec<RoleRecord>,
}

/// Errors from one adapter fetch. All variants count as an upstream failure
/// for failure tracking; none is fatal to a sync cycle.
///
/// `Display` and `Error` are hand-implemented because `thiserror` would
/// treat the domain `source: Source` fields as the error's cause.
#[derive(Debug)]
pub enum SourceError {
    Transport(TransportError),

    Malformed { source: Source, detail: String },

    NotFound { source: Source, id: String },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => err.fmt(f),
            Self::Malformed { source, detail } => {
                write!(f, "malformed payload from {}: {detail}", source.label())
            }
            Self::NotFound { source, id } => {
                write!(f, "member {id} not known to {}", source.label())
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Malformed { .. } | Self::NotFound { .. } => None,
        }
    }
}

impl From<TransportError> for SourceError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}
