//! Keyed persistence abstraction for member aggregates.
//!
//! The sync engine assumes nothing beyond get/upsert by id; in particular no
//! transactional guarantee, so a stale read-then-write race between
//! concurrent cycles for the same id is not corrected here (callers must not
//! run two cycles for one member concurrently).

use std::collections::HashMap;

use async_trait::async_trait;
use legisync_engine::model::MemberAggregate;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Keyed record store for [`MemberAggregate`]s.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Fetch one aggregate by id.
    async fn get(&self, id: &str) -> Result<Option<MemberAggregate>, StoreError>;

    /// Bulk fetch; missing ids are simply absent from the result.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<MemberAggregate>, StoreError>;

    /// Insert or replace one aggregate.
    async fn upsert(&self, aggregate: MemberAggregate) -> Result<(), StoreError>;
}

/// In-memory store used by the CLI and tests; the production persistence
/// layer plugs in behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    members: Mutex<HashMap<String, MemberAggregate>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<MemberAggregate>, StoreError> {
        Ok(self.members.lock().await.get(id).cloned())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<MemberAggregate>, StoreError> {
        let members = self.members.lock().await;
        Ok(ids.iter().filter_map(|id| members.get(id).cloned()).collect())
    }

    async fn upsert(&self, aggregate: MemberAggregate) -> Result<(), StoreError> {
        self.members
            .lock()
            .await
            .insert(aggregate.id.clone(), aggregate);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = MemoryStore::new();
        let agg = MemberAggregate::new("S000622");

        store.upsert(agg.clone()).await.unwrap();

        assert_eq!(store.get("S000622").await.unwrap(), Some(agg));
        assert_eq!(store.get("A000360").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_many_skips_missing_ids() {
        let store = MemoryStore::new();
        store.upsert(MemberAggregate::new("A000360")).await.unwrap();
        store.upsert(MemberAggregate::new("B001288")).await.unwrap();

        let found = store
            .get_many(&["B001288".into(), "Z999999".into(), "A000360".into()])
            .await
            .unwrap();

        let ids: Vec<&str> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["B001288", "A000360"]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing() {
        let store = MemoryStore::new();
        let mut agg = MemberAggregate::new("S000622");
        store.upsert(agg.clone()).await.unwrap();

        agg.profile_picture_uri = "https://example.com/s000622.jpg".into();
        store.upsert(agg.clone()).await.unwrap();

        let fetched = store.get("S000622").await.unwrap().unwrap();
        assert_eq!(fetched.profile_picture_uri, agg.profile_picture_uri);
    }
}
