//! In-memory metadata store implementation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{ArtifactId, ArtifactRecord, DepotError};
use crate::ports::MetadataStore;

/// In-memory metadata state.
struct MetadataState {
    /// All artifact rows, keyed by id (single source of truth).
    records: HashMap<ArtifactId, ArtifactRecord>,

    /// Tag rows, one set per artifact. The set enforces the
    /// `(artifact_id, name)` uniqueness constraint.
    tags: HashMap<ArtifactId, BTreeSet<String>>,

    /// Insertion order of ids, for deterministic listing.
    order: Vec<ArtifactId>,
}

impl MetadataState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            tags: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Clone a row with its tags filled in (BTreeSet iterates sorted).
    fn with_tags(&self, id: &ArtifactId) -> Option<ArtifactRecord> {
        let mut record = self.records.get(id)?.clone();
        record.tags = self
            .tags
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        Some(record)
    }
}

/// In-memory metadata store.
///
/// One mutex over the whole state makes every trait method a single atomic
/// unit of work, which is exactly the per-operation transactionality the
/// port requires. The lock is confined to the method body; nothing awaits
/// I/O while holding it.
pub struct InMemoryMetadataStore {
    state: Arc<Mutex<MetadataState>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MetadataState::new())),
        }
    }

    /// Number of artifact rows (for assertions).
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn create(&self, record: ArtifactRecord) -> Result<(), DepotError> {
        let mut state = self.state.lock().await;

        if state.records.contains_key(&record.id) {
            return Err(DepotError::DuplicateIdentifier);
        }

        let id = record.id.clone();
        // The tag set is the authoritative copy; reads rebuild record.tags
        // from it.
        let tags: BTreeSet<String> = record.tags.iter().cloned().collect();
        state.tags.insert(id.clone(), tags);
        state.records.insert(id.clone(), record);
        state.order.push(id);
        Ok(())
    }

    async fn get(&self, id: &ArtifactId) -> Result<ArtifactRecord, DepotError> {
        let state = self.state.lock().await;
        state.with_tags(id).ok_or(DepotError::NotFound)
    }

    async fn list(
        &self,
        required_tags: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<ArtifactRecord>, DepotError> {
        let state = self.state.lock().await;

        let mut out = Vec::new();
        for id in &state.order {
            if out.len() >= limit {
                break;
            }
            let tag_set = state.tags.get(id);
            let holds_all = required_tags
                .iter()
                .all(|t| tag_set.is_some_and(|set| set.contains(t)));
            if holds_all && let Some(record) = state.with_tags(id) {
                out.push(record);
            }
        }
        Ok(out)
    }

    async fn delete(&self, id: &ArtifactId) -> Result<(), DepotError> {
        let mut state = self.state.lock().await;

        if state.records.remove(id).is_none() {
            return Err(DepotError::NotFound);
        }
        // Cascading: the tag rows go in the same unit of work.
        state.tags.remove(id);
        state.order.retain(|other| other != id);
        Ok(())
    }

    async fn add_tag(&self, id: &ArtifactId, name: &str) -> Result<(), DepotError> {
        let mut state = self.state.lock().await;

        if !state.records.contains_key(id) {
            return Err(DepotError::NotFound);
        }
        let tags = state.tags.entry(id.clone()).or_default();
        if !tags.insert(name.to_string()) {
            return Err(DepotError::DuplicateTag);
        }
        Ok(())
    }

    async fn remove_tag(&self, id: &ArtifactId, name: &str) -> Result<(), DepotError> {
        let mut state = self.state.lock().await;

        if !state.records.contains_key(id) {
            return Err(DepotError::NotFound);
        }
        let removed = state
            .tags
            .get_mut(id)
            .is_some_and(|tags| tags.remove(name));
        if !removed {
            return Err(DepotError::TagNotFound);
        }
        Ok(())
    }

    async fn set_retention(
        &self,
        id: &ArtifactId,
        until: Option<DateTime<Utc>>,
    ) -> Result<ArtifactRecord, DepotError> {
        let mut state = self.state.lock().await;

        let Some(record) = state.records.get_mut(id) else {
            return Err(DepotError::NotFound);
        };

        if let Some(until) = until
            && until <= record.created_at
        {
            return Err(DepotError::InvalidDeadline(format!(
                "deadline {until} is not after creation time {}",
                record.created_at
            )));
        }

        record.retained_until = until;
        let updated = state.with_tags(id).expect("row was just updated");
        Ok(updated)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ArtifactRecord>, DepotError> {
        let state = self.state.lock().await;

        let mut out = Vec::new();
        for id in &state.order {
            if let Some(record) = state.records.get(id)
                && record.is_expired(now)
                && let Some(full) = state.with_tags(id)
            {
                out.push(full);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    fn record(key: &str, created_at: DateTime<Utc>) -> ArtifactRecord {
        ArtifactRecord::new(
            ArtifactId::new(key.to_string()).unwrap(),
            "application/octet-stream",
            format!("{key}.bin"),
            16,
            created_at,
        )
    }

    fn tag_set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));

        store.create(row.clone()).await.unwrap();
        let got = store.get(&row.id).await.unwrap();

        assert_eq!(got.id, row.id);
        assert_eq!(got.file_size, 16);
        assert!(got.tags.is_empty());
    }

    #[tokio::test]
    async fn create_twice_is_duplicate_identifier() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));

        store.create(row.clone()).await.unwrap();
        let err = store.create(row).await.unwrap_err();

        assert!(matches!(err, DepotError::DuplicateIdentifier));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = InMemoryMetadataStore::new();
        let id = ArtifactId::new("aaaa01").unwrap();
        assert!(matches!(store.get(&id).await, Err(DepotError::NotFound)));
    }

    #[tokio::test]
    async fn tags_are_unique_per_artifact() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));
        store.create(row.clone()).await.unwrap();

        store.add_tag(&row.id, "release").await.unwrap();
        let err = store.add_tag(&row.id, "release").await.unwrap_err();
        assert!(matches!(err, DepotError::DuplicateTag));

        let got = store.get(&row.id).await.unwrap();
        assert_eq!(got.tags, vec!["release"]);
    }

    #[tokio::test]
    async fn tags_come_back_sorted() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));
        store.create(row.clone()).await.unwrap();

        for tag in ["zeta", "alpha", "mid"] {
            store.add_tag(&row.id, tag).await.unwrap();
        }

        let got = store.get(&row.id).await.unwrap();
        assert_eq!(got.tags, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn remove_tag_errors() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));
        store.create(row.clone()).await.unwrap();

        let err = store.remove_tag(&row.id, "ghost").await.unwrap_err();
        assert!(matches!(err, DepotError::TagNotFound));

        let missing = ArtifactId::new("bbbb02").unwrap();
        let err = store.remove_tag(&missing, "ghost").await.unwrap_err();
        assert!(matches!(err, DepotError::NotFound));
    }

    #[tokio::test]
    async fn remove_tag_then_add_again() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));
        store.create(row.clone()).await.unwrap();

        store.add_tag(&row.id, "nightly").await.unwrap();
        store.remove_tag(&row.id, "nightly").await.unwrap();
        store.add_tag(&row.id, "nightly").await.unwrap();

        assert_eq!(store.get(&row.id).await.unwrap().tags, vec!["nightly"]);
    }

    #[tokio::test]
    async fn list_is_an_intersection_not_a_union() {
        let store = InMemoryMetadataStore::new();
        let a = record("aaaa01", ts(0));
        let b = record("bbbb02", ts(1));
        let c = record("cccc03", ts(2));
        for row in [&a, &b, &c] {
            store.create(row.clone()).await.unwrap();
        }

        store.add_tag(&a.id, "linux").await.unwrap();
        store.add_tag(&a.id, "release").await.unwrap();
        store.add_tag(&b.id, "linux").await.unwrap();
        store.add_tag(&c.id, "release").await.unwrap();

        let both = store.list(&tag_set(&["linux", "release"]), 10).await.unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, a.id);

        let linux = store.list(&tag_set(&["linux"]), 10).await.unwrap();
        let ids: Vec<_> = linux.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![a.id.clone(), b.id.clone()]);
    }

    #[tokio::test]
    async fn list_respects_limit_and_insertion_order() {
        let store = InMemoryMetadataStore::new();
        for key in ["aaaa01", "bbbb02", "cccc03"] {
            let row = record(key, ts(0));
            store.create(row.clone()).await.unwrap();
            store.add_tag(&row.id, "bulk").await.unwrap();
        }

        let listed = store.list(&tag_set(&["bulk"]), 2).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["aaaa01", "bbbb02"]);
    }

    #[tokio::test]
    async fn delete_removes_row_and_tags_together() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));
        store.create(row.clone()).await.unwrap();
        store.add_tag(&row.id, "keep").await.unwrap();

        store.delete(&row.id).await.unwrap();

        assert!(matches!(store.get(&row.id).await, Err(DepotError::NotFound)));
        assert!(store.list(&tag_set(&["keep"]), 10).await.unwrap().is_empty());
        assert!(matches!(
            store.delete(&row.id).await,
            Err(DepotError::NotFound)
        ));
    }

    #[tokio::test]
    async fn retention_must_be_after_creation() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(6));
        store.create(row.clone()).await.unwrap();

        // Not strictly after created_at: rejected, row untouched.
        let err = store.set_retention(&row.id, Some(ts(6))).await.unwrap_err();
        assert!(matches!(err, DepotError::InvalidDeadline(_)));
        let err = store.set_retention(&row.id, Some(ts(3))).await.unwrap_err();
        assert!(matches!(err, DepotError::InvalidDeadline(_)));
        assert_eq!(store.get(&row.id).await.unwrap().retained_until, None);

        let updated = store.set_retention(&row.id, Some(ts(7))).await.unwrap();
        assert_eq!(updated.retained_until, Some(ts(7)));
    }

    #[tokio::test]
    async fn clearing_retention_restores_indefinite() {
        let store = InMemoryMetadataStore::new();
        let row = record("aaaa01", ts(0));
        store.create(row.clone()).await.unwrap();

        store.set_retention(&row.id, Some(ts(5))).await.unwrap();
        let cleared = store.set_retention(&row.id, None).await.unwrap();
        assert_eq!(cleared.retained_until, None);

        assert!(store.list_expired(ts(23)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_expired_is_strict_and_skips_indefinite() {
        let store = InMemoryMetadataStore::new();
        let expired = record("aaaa01", ts(0));
        let pending = record("bbbb02", ts(0));
        let forever = record("cccc03", ts(0));
        for row in [&expired, &pending, &forever] {
            store.create(row.clone()).await.unwrap();
        }

        store.set_retention(&expired.id, Some(ts(2))).await.unwrap();
        store.set_retention(&pending.id, Some(ts(9))).await.unwrap();

        let now = ts(5);
        let hits = store.list_expired(now).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![expired.id.clone()]);

        // Exactly at the deadline is not yet expired.
        let at_deadline = store.list_expired(ts(2)).await.unwrap();
        assert!(at_deadline.is_empty());

        // No deadline means never expired, no matter how old.
        let far = ts(0) + Duration::days(10_000);
        let hits = store.list_expired(far).await.unwrap();
        assert!(!hits.iter().any(|r| r.id == forever.id));
    }
}
