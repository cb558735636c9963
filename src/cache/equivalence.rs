//! Memoized canonicalization results.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    Result, identifiers::StateKey, ports::EquivalenceRepository, records::EquivalenceRecord,
};

/// Local map of equivalence records over the durable equivalence repository.
///
/// Records are written once per state and never change afterwards, so a local
/// hit never needs revalidation.
pub struct EquivalenceCache {
    local: RwLock<HashMap<StateKey, EquivalenceRecord>>,
    repository: Arc<dyn EquivalenceRepository>,
}

impl EquivalenceCache {
    pub fn new(repository: Arc<dyn EquivalenceRepository>) -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            repository,
        }
    }

    pub fn get(&self, key: &StateKey) -> Result<Option<EquivalenceRecord>> {
        if let Some(record) = self.local.read().get(key) {
            return Ok(Some(record.clone()));
        }

        let found = self.repository.find_equivalence(key)?;
        if let Some(record) = &found {
            self.local
                .write()
                .entry(key.clone())
                .or_insert_with(|| record.clone());
        }
        Ok(found)
    }

    /// Store `record` durably, then locally.
    pub fn record(&self, record: EquivalenceRecord) -> Result<()> {
        self.repository.upsert_equivalence(&record)?;
        self.local.write().insert(record.key.clone(), record);
        Ok(())
    }

    pub fn local_len(&self) -> usize {
        self.local.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryStore;

    fn record(key: &str) -> EquivalenceRecord {
        EquivalenceRecord {
            key: StateKey::new(key),
            representative_key: StateKey::new("rep"),
            transform: None,
        }
    }

    #[test]
    fn test_record_then_get_hits_locally() {
        let repo = InMemoryStore::new();
        let cache = EquivalenceCache::new(Arc::new(repo.clone()));
        cache.record(record("a")).unwrap();
        assert_eq!(repo.equivalence_count(), 1);

        repo.set_available(false);
        let found = cache.get(&StateKey::new("a")).unwrap().unwrap();
        assert_eq!(found.representative_key, "rep");
    }

    #[test]
    fn test_get_reads_through() {
        let repo = InMemoryStore::new();
        repo.upsert_equivalence(&record("b")).unwrap();
        let cache = EquivalenceCache::new(Arc::new(repo.clone()));

        assert_eq!(cache.local_len(), 0);
        assert!(cache.get(&StateKey::new("b")).unwrap().is_some());
        assert_eq!(cache.local_len(), 1);
        assert!(cache.get(&StateKey::new("c")).unwrap().is_none());
    }
}
