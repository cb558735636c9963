//! Repository ports for the durable store.
//!
//! The caches only ever talk to the durable tier through these traits, so any
//! keyed store with replace-or-insert semantics can back them: the embedded
//! MessagePack logs, or the in-memory double used in tests.

use crate::{
    Result,
    identifiers::StateKey,
    records::{EquivalenceRecord, ValueRecord},
};

/// Durable storage of value-mapping records, keyed by canonical state key.
///
/// # Examples
///
/// ```
/// use quarto_memory::adapters::InMemoryStore;
/// use quarto_memory::identifiers::StateKey;
/// use quarto_memory::ports::ValueRepository;
///
/// fn lookup<R: ValueRepository>(repo: &R, key: &StateKey) -> quarto_memory::Result<bool> {
///     Ok(repo.find_by_key(key)?.is_some())
/// }
///
/// let store = InMemoryStore::new();
/// assert!(!lookup(&store, &StateKey::new("*,_"))?);
/// # Ok::<(), quarto_memory::Error>(())
/// ```
pub trait ValueRepository: Send + Sync {
    /// Fetch the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreUnavailable`] if the store cannot be reached.
    fn find_by_key(&self, key: &StateKey) -> Result<Option<ValueRecord>>;

    /// Fetch the first record whose key is in `keys`, in a single query.
    fn find_any_by_key(&self, keys: &[StateKey]) -> Result<Option<ValueRecord>>;

    /// Replace or insert the record under its own key.
    fn upsert(&self, record: &ValueRecord) -> Result<()>;

    /// Replace or insert every record; later records win on duplicate keys.
    fn bulk_upsert(&self, records: &[ValueRecord]) -> Result<()>;

    /// Every stored key.
    fn keys(&self) -> Result<Vec<StateKey>>;
}

/// Durable storage of canonicalization results.
pub trait EquivalenceRepository: Send + Sync {
    fn find_equivalence(&self, key: &StateKey) -> Result<Option<EquivalenceRecord>>;

    /// Replace or insert the record under its own key.
    fn upsert_equivalence(&self, record: &EquivalenceRecord) -> Result<()>;
}
