//! Shared learning memory: value records, equivalences and canonicalization.
//!
//! A [`Memory`] is the handle every agent receives at construction. Clones are
//! cheap and all of them see the same caches, durable store and writer.

pub mod canonicalizer;
pub mod equivalence;
pub mod value_store;

use std::sync::Arc;

pub use canonicalizer::{Canonical, Canonicalizer};
pub use equivalence::EquivalenceCache;
pub use value_store::ValueStore;

use crate::{
    Result,
    persistence::BatchWriter,
    ports::{EquivalenceRepository, ValueRepository},
    quarto::State,
};

/// Handle to the caches shared by concurrent agents.
#[derive(Clone)]
pub struct Memory {
    values: Arc<ValueStore>,
    equivalences: Arc<EquivalenceCache>,
    canonicalizer: Arc<Canonicalizer>,
    writer: Arc<BatchWriter>,
}

impl Memory {
    pub fn new(
        values: Arc<dyn ValueRepository>,
        equivalences: Arc<dyn EquivalenceRepository>,
        writer: Arc<BatchWriter>,
    ) -> Self {
        let values = Arc::new(ValueStore::new(values, Arc::clone(&writer)));
        let equivalences = Arc::new(EquivalenceCache::new(equivalences));
        let canonicalizer = Arc::new(Canonicalizer::new(
            Arc::clone(&values),
            Arc::clone(&equivalences),
        ));
        Self {
            values,
            equivalences,
            canonicalizer,
            writer,
        }
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    pub fn equivalences(&self) -> &EquivalenceCache {
        &self.equivalences
    }

    pub fn writer(&self) -> &BatchWriter {
        &self.writer
    }

    pub fn canonicalize(&self, state: &State) -> Result<Canonical> {
        self.canonicalizer.canonicalize(state)
    }

    /// Wait until every queued update is durable.
    pub fn flush(&self) -> Result<()> {
        self.writer.flush()
    }
}
