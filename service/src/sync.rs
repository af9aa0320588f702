//! Sync orchestration: one full reconciliation cycle per member.
//!
//! A cycle walks a fixed ordered list of upstream sources sequentially (by
//! design, so merge ordering stays deterministic and the in-memory aggregate
//! is never raced by concurrent upstream calls), merges each successful fetch
//! into that source's snapshot, applies any user override, attempts the
//! profile-picture side fetch, and unconditionally recomputes the outward
//! projection from whatever data is available.
//!
//! Failure policy (per source, per member):
//!
//! - fetch failure increments the snapshot's `fail_count` and the cycle moves
//!   on; a single source can never sink the cycle
//! - a source that has failed `max_fail_count` times without ever succeeding
//!   is presumed to have no data for this member and is skipped without a
//!   network call (a suppression, not a removal)
//! - success resets `fail_count` and stamps `update_timestamp`
//!
//! Callers must not run two concurrent cycles for the same member id; the
//! snapshots are read-modify-written through the store without isolation.

use std::sync::Arc;

use legisync_engine::fields::merge_member;
use legisync_engine::model::{MemberAggregate, MemberRecord, Source};
use legisync_engine::resolve::resolve;
use legisync_engine::roles::resync_same_source;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::sources::{
    BioguideAdapter, FetchedMember, GovtrackAdapter, SourceError, SourceTransport,
    UnitedstatesAdapter,
};
use crate::store::{MemberStore, StoreError};

/// Upstream fetch order. User edits are not fetched; they arrive as payloads.
const UPSTREAM_ORDER: [Source; 3] = [Source::Bioguide, Source::Govtrack, Source::Unitedstates];

/// A user-curated edit for one member. Empty fields are "no edit"; user
/// values are additive-only and never contribute role periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverridePayload {
    pub id: String,
    pub record: MemberRecord,
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Hard precondition violation, rejected rather than logged.
    #[error("override payload targets member {payload_id} but sync was requested for {target_id}")]
    IdMismatch {
        target_id: String,
        payload_id: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The three upstream adapters, grouped for injection.
pub struct SourceAdapters {
    pub bioguide: BioguideAdapter,
    pub govtrack: GovtrackAdapter,
    pub unitedstates: UnitedstatesAdapter,
}

pub struct SyncOrchestrator {
    adapters: SourceAdapters,
    transport: Arc<dyn SourceTransport>,
    store: Arc<dyn MemberStore>,
    clock: Arc<dyn Clock>,
    photo_base_url: String,
    max_fail_count: u32,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(
        adapters: SourceAdapters,
        transport: Arc<dyn SourceTransport>,
        store: Arc<dyn MemberStore>,
        clock: Arc<dyn Clock>,
        photo_base_url: impl Into<String>,
        max_fail_count: u32,
    ) -> Self {
        Self {
            adapters,
            transport,
            store,
            clock,
            photo_base_url: photo_base_url.into(),
            max_fail_count,
        }
    }

    /// Run one full sync cycle for `id`, creating the aggregate on first
    /// reference, and persist the result.
    ///
    /// # Errors
    /// Only a store failure or an override/id mismatch propagates; upstream
    /// failures are tracked per source and never fail the cycle.
    pub async fn sync_member(
        &self,
        id: &str,
        override_payload: Option<OverridePayload>,
    ) -> Result<MemberAggregate, SyncError> {
        if let Some(payload) = &override_payload {
            if payload.id != id {
                return Err(SyncError::IdMismatch {
                    target_id: id.to_string(),
                    payload_id: payload.id.clone(),
                });
            }
        }

        let mut aggregate = self
            .store
            .get(id)
            .await?
            .unwrap_or_else(|| MemberAggregate::new(id));

        for source in UPSTREAM_ORDER {
            self.sync_source(&mut aggregate, source, id).await;
        }

        if let Some(payload) = override_payload {
            self.apply_override(&mut aggregate, &payload);
        }

        self.fetch_picture(&mut aggregate).await;

        let resolution = resolve(
            id,
            &aggregate.bioguide,
            &aggregate.govtrack,
            &aggregate.unitedstates,
            &aggregate.user,
        );
        aggregate.projection = resolution.projection;
        aggregate.projection_roles = resolution.roles;
        aggregate.override_conflicts = resolution.override_conflicts;

        self.store.upsert(aggregate.clone()).await?;
        Ok(aggregate)
    }

    /// Sync a list of members sequentially, pre-warming the shared dataset
    /// copy once up front.
    ///
    /// # Errors
    /// Propagates the first store failure; upstream failures do not stop the
    /// run.
    pub async fn sync_members(&self, ids: &[String]) -> Result<Vec<MemberAggregate>, SyncError> {
        if let Err(err) = self.adapters.unitedstates.prewarm().await {
            warn!(error = %err, "dataset pre-warm failed; per-member fetches will retry");
        }

        let mut aggregates = Vec::with_capacity(ids.len());
        for id in ids {
            aggregates.push(self.sync_member(id, None).await?);
        }
        Ok(aggregates)
    }

    async fn sync_source(&self, aggregate: &mut MemberAggregate, source: Source, id: &str) {
        let snapshot = aggregate.snapshot(source);
        if snapshot.record.fail_count >= self.max_fail_count
            && snapshot.record.update_timestamp == 0
        {
            debug!(
                id,
                source = source.label(),
                fail_count = snapshot.record.fail_count,
                "source never succeeded for this member; skipping fetch"
            );
            return;
        }

        match self.fetch(source, id).await {
            Ok(fetched) => {
                let now = self.clock.now_millis();
                let snapshot = aggregate.snapshot_mut(source);
                if snapshot.record.id.is_empty() {
                    snapshot.record.id = id.to_string();
                }

                let changes = merge_member(source, &mut snapshot.record, &fetched.record);
                let (roles, conflicts) = resync_same_source(&snapshot.roles, &fetched.roles);
                snapshot.roles = roles;
                snapshot.record.update_timestamp = now;
                snapshot.record.fail_count = 0;

                info!(
                    id,
                    source = source.label(),
                    field_changes = changes.len(),
                    roles = snapshot.roles.len(),
                    role_conflicts = conflicts.len(),
                    "source merged"
                );
            }
            Err(err) => {
                let snapshot = aggregate.snapshot_mut(source);
                snapshot.record.fail_count += 1;
                warn!(
                    id,
                    source = source.label(),
                    fail_count = snapshot.record.fail_count,
                    error = %err,
                    "source fetch failed; continuing cycle"
                );
            }
        }
    }

    async fn fetch(&self, source: Source, id: &str) -> Result<FetchedMember, SourceError> {
        match source {
            Source::Bioguide => self.adapters.bioguide.fetch_member(id).await,
            Source::Govtrack => self.adapters.govtrack.fetch_member(id).await,
            Source::Unitedstates => self.adapters.unitedstates.fetch_member(id).await,
            // Not an upstream; nothing to fetch.
            Source::UserEdits => Err(SourceError::NotFound {
                source,
                id: id.to_string(),
            }),
        }
    }

    fn apply_override(&self, aggregate: &mut MemberAggregate, payload: &OverridePayload) {
        let now = self.clock.now_millis();
        let snapshot = aggregate.snapshot_mut(Source::UserEdits);
        if snapshot.record.id.is_empty() {
            snapshot.record.id.clone_from(&payload.id);
        }

        let changes = merge_member(Source::UserEdits, &mut snapshot.record, &payload.record);
        snapshot.record.update_timestamp = now;
        if !changes.is_empty() {
            info!(
                id = payload.id.as_str(),
                fields = changes.len(),
                "user override applied"
            );
        }
    }

    /// One portrait fetch attempt per cycle, only while no URI is recorded
    /// and the independent picture failure counter is under the threshold.
    async fn fetch_picture(&self, aggregate: &mut MemberAggregate) {
        if !aggregate.profile_picture_uri.is_empty()
            || aggregate.picture_fail_count >= self.max_fail_count
        {
            return;
        }

        let url = format!("{}/{}.jpg", self.photo_base_url, aggregate.id);
        match self.transport.fetch(&url).await {
            Ok(_) => {
                info!(id = aggregate.id.as_str(), url = url.as_str(), "portrait found");
                aggregate.profile_picture_uri = url;
            }
            Err(err) => {
                aggregate.picture_fail_count += 1;
                warn!(
                    id = aggregate.id.as_str(),
                    fail_count = aggregate.picture_fail_count,
                    error = %err,
                    "portrait fetch failed"
                );
            }
        }
    }
}
