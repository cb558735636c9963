//! In-memory durable store for testing.
//!
//! This adapter provides a pure in-memory implementation of both repository
//! ports, enabling fast tests without any file system I/O. An availability
//! switch lets tests simulate an unreachable store.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{
    Result,
    error::Error,
    identifiers::StateKey,
    ports::{EquivalenceRepository, ValueRepository},
    records::{EquivalenceRecord, ValueRecord},
};

/// In-memory store for testing.
///
/// # Examples
///
/// ```
/// use quarto_memory::adapters::InMemoryStore;
/// use quarto_memory::ports::ValueRepository;
/// use quarto_memory::identifiers::StateKey;
///
/// let store = InMemoryStore::new();
/// store.set_available(false);
/// assert!(store.find_by_key(&StateKey::new("*")).is_err());
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying storage and availability switch.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    values: Mutex<HashMap<StateKey, ValueRecord>>,
    equivalences: Mutex<HashMap<StateKey, EquivalenceRecord>>,
    available: AtomicBool,
    bulk_upserts: AtomicUsize,
}

impl InMemoryStore {
    /// Create a new, empty and reachable store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                values: Mutex::new(HashMap::new()),
                equivalences: Mutex::new(HashMap::new()),
                available: AtomicBool::new(true),
                bulk_upserts: AtomicUsize::new(0),
            }),
        }
    }

    /// Simulate the store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    /// Number of value-mapping records currently stored.
    pub fn value_count(&self) -> usize {
        self.inner.values.lock().len()
    }

    pub fn equivalence_count(&self) -> usize {
        self.inner.equivalences.lock().len()
    }

    /// Number of successful `bulk_upsert` calls.
    pub fn bulk_upsert_calls(&self) -> usize {
        self.inner.bulk_upserts.load(Ordering::SeqCst)
    }

    /// Stored record for `key`, bypassing the availability switch.
    pub fn peek(&self, key: &StateKey) -> Option<ValueRecord> {
        self.inner.values.lock().get(key).cloned()
    }

    /// Clear all stored records.
    pub fn clear(&self) {
        self.inner.values.lock().clear();
        self.inner.equivalences.lock().clear();
    }

    fn ensure_available(&self, operation: &str) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::StoreUnavailable {
                operation: operation.to_string(),
                message: "in-memory store switched off".to_string(),
            })
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueRepository for InMemoryStore {
    fn find_by_key(&self, key: &StateKey) -> Result<Option<ValueRecord>> {
        self.ensure_available("find_by_key")?;
        Ok(self.inner.values.lock().get(key).cloned())
    }

    fn find_any_by_key(&self, keys: &[StateKey]) -> Result<Option<ValueRecord>> {
        self.ensure_available("find_any_by_key")?;
        let values = self.inner.values.lock();
        Ok(keys.iter().find_map(|key| values.get(key).cloned()))
    }

    fn upsert(&self, record: &ValueRecord) -> Result<()> {
        self.ensure_available("upsert")?;
        self.inner
            .values
            .lock()
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    fn bulk_upsert(&self, records: &[ValueRecord]) -> Result<()> {
        self.ensure_available("bulk_upsert")?;
        let mut values = self.inner.values.lock();
        for record in records {
            values.insert(record.key.clone(), record.clone());
        }
        self.inner.bulk_upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<StateKey>> {
        self.ensure_available("keys")?;
        Ok(self.inner.values.lock().keys().cloned().collect())
    }
}

impl EquivalenceRepository for InMemoryStore {
    fn find_equivalence(&self, key: &StateKey) -> Result<Option<EquivalenceRecord>> {
        self.ensure_available("find_equivalence")?;
        Ok(self.inner.equivalences.lock().get(key).cloned())
    }

    fn upsert_equivalence(&self, record: &EquivalenceRecord) -> Result<()> {
        self.ensure_available("upsert_equivalence")?;
        self.inner
            .equivalences
            .lock()
            .insert(record.key.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{identifiers::ActionKey, quarto::Slot, types::Value};

    fn record(key: &str, value: f64) -> ValueRecord {
        ValueRecord {
            key: StateKey::new(key),
            raw_state: vec![Slot::Given],
            action_values: vec![(ActionKey::new("0,0,0,-"), Value::new(value))],
        }
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = InMemoryStore::new();
        store.upsert(&record("a", 0.0)).unwrap();
        store.upsert(&record("a", 0.5)).unwrap();
        assert_eq!(store.value_count(), 1);
        let found = store.find_by_key(&StateKey::new("a")).unwrap().unwrap();
        assert_eq!(found.action_values[0].1, Value::new(0.5));
    }

    #[test]
    fn test_find_any_returns_first_match_in_order() {
        let store = InMemoryStore::new();
        store.upsert(&record("b", 0.1)).unwrap();
        store.upsert(&record("c", 0.2)).unwrap();
        let keys = [StateKey::new("a"), StateKey::new("c"), StateKey::new("b")];
        let found = store.find_any_by_key(&keys).unwrap().unwrap();
        assert_eq!(found.key, "c");
        assert!(
            store
                .find_any_by_key(&[StateKey::new("z")])
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_bulk_upsert_last_write_wins() {
        let store = InMemoryStore::new();
        store
            .bulk_upsert(&[record("a", 0.1), record("a", 0.9)])
            .unwrap();
        let stored = store.peek(&StateKey::new("a")).unwrap();
        assert_eq!(stored.action_values[0].1, Value::new(0.9));
        assert_eq!(store.bulk_upsert_calls(), 1);
    }

    #[test]
    fn test_unavailable_store_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_available(false);
        let key = StateKey::new("a");
        assert!(store.find_by_key(&key).unwrap_err().is_store_unavailable());
        assert!(store.upsert(&record("a", 0.0)).is_err());
        assert!(store.bulk_upsert(&[]).is_err());
        assert!(store.find_equivalence(&key).is_err());
        store.set_available(true);
        assert!(store.find_by_key(&key).unwrap().is_none());
    }

    #[test]
    fn test_clone_shares_storage() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.upsert(&record("shared", 0.0)).unwrap();
        assert_eq!(other.value_count(), 1);
        other.set_available(false);
        assert!(!store.is_available());
    }
}
