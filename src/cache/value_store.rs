//! Two-tier store of value-mapping records.
//!
//! The local tier maps state keys to records and is filled by read-through.
//! Each record sits behind its own lock so that updates to different states
//! never contend, while read-modify-write on one state is serialized.

use std::{collections::HashMap, sync::Arc};

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::{
    Result,
    error::Error,
    identifiers::{ActionKey, StateKey},
    persistence::BatchWriter,
    ports::ValueRepository,
    quarto::{Action, State},
    records::ValueRecord,
    types::Value,
};

type Entry = Arc<Mutex<ValueRecord>>;

pub struct ValueStore {
    local: RwLock<HashMap<StateKey, Entry>>,
    repository: Arc<dyn ValueRepository>,
    writer: Arc<BatchWriter>,
}

impl ValueStore {
    pub fn new(repository: Arc<dyn ValueRepository>, writer: Arc<BatchWriter>) -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            repository,
            writer,
        }
    }

    /// Record stored under `key`, reading through to the durable store.
    ///
    /// # Errors
    ///
    /// A durable store failure is returned as is, never reported as a miss.
    pub fn find(&self, key: &StateKey) -> Result<Option<ValueRecord>> {
        Ok(self.entry(key)?.map(|entry| entry.lock().clone()))
    }

    /// First record found among `keys`, checking every key locally before a
    /// single durable query.
    pub fn find_any(&self, keys: &[StateKey]) -> Result<Option<ValueRecord>> {
        {
            let local = self.local.read();
            if let Some(entry) = keys.iter().find_map(|key| local.get(key)) {
                return Ok(Some(entry.lock().clone()));
            }
        }

        match self.repository.find_any_by_key(keys)? {
            Some(record) => Ok(Some(self.cache(record).lock().clone())),
            None => Ok(None),
        }
    }

    /// Create the record for `state` with `actions` at their current values.
    ///
    /// Inserting a key that already has a record, in either tier, keeps the
    /// existing record and returns it.
    pub fn insert(&self, state: &State, actions: &[Action]) -> Result<ValueRecord> {
        let key = state.key();
        if let Some(existing) = self.entry(&key)? {
            return Ok(existing.lock().clone());
        }

        let record = ValueRecord::new(state, actions);
        self.repository.upsert(&record)?;
        debug!("Created value record for {key} with {} actions", actions.len());
        Ok(self.cache(record).lock().clone())
    }

    /// Overwrite one action's value with `action.value`.
    pub fn update(&self, key: &StateKey, action: &Action) -> Result<Value> {
        let value = action.value;
        self.adjust(key, &action.key(), |_| value)
    }

    /// Replace one action's value with `f(current)`, clamped to the reward range.
    ///
    /// The whole record is queued for the batch writer while its lock is held,
    /// so queued records for one key follow the order of the updates. If the
    /// record cannot be queued the old value is kept.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownState`] if no record exists for `key`,
    /// [`Error::InvalidState`] if the record has no such action.
    pub fn adjust<F>(&self, key: &StateKey, action: &ActionKey, f: F) -> Result<Value>
    where
        F: FnOnce(Value) -> Value,
    {
        let entry = self.entry(key)?.ok_or_else(|| Error::UnknownState {
            state: key.to_string(),
        })?;

        let mut record = entry.lock();
        let current = record.get(action).ok_or_else(|| Error::InvalidState {
            message: format!("state '{key}' has no action '{action}'"),
        })?;
        let updated = Value::new(f(current).get());
        record.set(action, updated);
        if let Err(e) = self.writer.enqueue(record.clone()) {
            record.set(action, current);
            return Err(e);
        }
        Ok(updated)
    }

    /// Number of records held in the local tier.
    pub fn local_len(&self) -> usize {
        self.local.read().len()
    }

    /// Drop the local tier; later reads go back to the durable store.
    pub fn clear_local(&self) {
        self.local.write().clear();
    }

    fn entry(&self, key: &StateKey) -> Result<Option<Entry>> {
        if let Some(entry) = self.local.read().get(key) {
            return Ok(Some(Arc::clone(entry)));
        }
        Ok(self
            .repository
            .find_by_key(key)?
            .map(|record| self.cache(record)))
    }

    /// Put `record` in the local tier unless another thread got there first.
    fn cache(&self, record: ValueRecord) -> Entry {
        let mut local = self.local.write();
        Arc::clone(
            local
                .entry(record.key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(record))),
        )
    }
}
