//! Canonicalization of states across their symmetry orbit.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use log::debug;
use parking_lot::Mutex;

use super::{equivalence::EquivalenceCache, value_store::ValueStore};
use crate::{
    Result,
    error::Error,
    identifiers::StateKey,
    quarto::{Action, State, Transform, orbit_states},
    records::{EquivalenceRecord, ValueRecord},
};

const STRIPES: usize = 64;

/// Representative of a state's orbit and the way back to the original frame.
#[derive(Debug, Clone)]
pub struct Canonical {
    pub state: State,
    /// Maps the original state onto `state`; `None` when they are the same.
    pub transform: Option<Transform>,
}

impl Canonical {
    pub fn key(&self) -> StateKey {
        self.state.key()
    }

    /// Express an action chosen in the representative's frame in the
    /// original frame.
    pub fn to_original(&self, action: &Action) -> Action {
        match &self.transform {
            Some(transform) => transform.transform_action(action),
            None => *action,
        }
    }
}

/// Finds the stored representative of a state, creating one on first sight.
///
/// Two threads canonicalizing members of the same unseen orbit serialize on a
/// lock stripe chosen by the orbit's smallest key, so an orbit never ends up
/// with two representatives.
pub struct Canonicalizer {
    values: Arc<ValueStore>,
    equivalences: Arc<EquivalenceCache>,
    stripes: Vec<Mutex<()>>,
}

impl Canonicalizer {
    pub fn new(values: Arc<ValueStore>, equivalences: Arc<EquivalenceCache>) -> Self {
        Self {
            values,
            equivalences,
            stripes: (0..STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Canonicalize a state that has a given token.
    ///
    /// On a first visit to the orbit the state becomes its own representative
    /// and a value record with every legal action at 0.0 is created for it.
    ///
    /// # Errors
    ///
    /// Store failures propagate. A state without a given token fails with
    /// [`crate::Error::NoGivenToken`] when its orbit is new.
    pub fn canonicalize(&self, state: &State) -> Result<Canonical> {
        let key = state.key();

        if let Some(record) = self.equivalences.get(&key)? {
            let representative = match &record.transform {
                Some(transform) => transform.transform_state(state)?,
                None => state.clone(),
            };
            debug!("Equivalence hit for {key}");
            return Ok(Canonical {
                state: representative,
                transform: record.transform,
            });
        }

        let images = orbit_states(state)?;
        let keys: Vec<StateKey> = images.iter().map(|(_, image)| image.key()).collect();

        let (transform, representative) = match self.values.find_any(&keys)? {
            Some(record) => Self::matching(images, &keys, &record)?,
            None => {
                let orbit_id = keys.iter().min().unwrap_or(&key);
                let _guard = self.stripe(orbit_id).lock();
                match self.values.find_any(&keys)? {
                    Some(record) => Self::matching(images, &keys, &record)?,
                    None => {
                        debug!("New orbit, {key} is its own representative");
                        self.values.insert(state, &state.legal_actions()?)?;
                        (None, state.clone())
                    }
                }
            }
        };

        let transform = transform.filter(|transform| !transform.is_identity());
        self.equivalences.record(EquivalenceRecord {
            key,
            representative_key: representative.key(),
            transform: transform.clone(),
        })?;

        Ok(Canonical {
            state: representative,
            transform,
        })
    }

    /// First orbit member whose key matches the found record.
    fn matching(
        images: Vec<(Transform, State)>,
        keys: &[StateKey],
        record: &ValueRecord,
    ) -> Result<(Option<Transform>, State)> {
        images
            .into_iter()
            .zip(keys)
            .find(|(_, key)| **key == record.key)
            .map(|((transform, image), _)| (Some(transform), image))
            .ok_or_else(|| Error::InvalidState {
                message: format!("record '{}' is outside the queried orbit", record.key),
            })
    }

    fn stripe(&self, orbit_id: &StateKey) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        orbit_id.hash(&mut hasher);
        &self.stripes[hasher.finish() as usize % STRIPES]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::InMemoryStore,
        persistence::{BatchWriter, WriterSettings},
        ports::ValueRepository,
        quarto::{Cell, Dimensions, Rotation},
    };

    struct Fixture {
        repo: InMemoryStore,
        canonicalizer: Canonicalizer,
        _writer: Arc<BatchWriter>,
    }

    fn fixture() -> Fixture {
        let repo = InMemoryStore::new();
        let writer = Arc::new(
            BatchWriter::spawn(Arc::new(repo.clone()), WriterSettings::default()).unwrap(),
        );
        let values = Arc::new(ValueStore::new(Arc::new(repo.clone()), Arc::clone(&writer)));
        let equivalences = Arc::new(EquivalenceCache::new(Arc::new(repo.clone())));
        Fixture {
            repo,
            canonicalizer: Canonicalizer::new(values, equivalences),
            _writer: writer,
        }
    }

    fn state() -> State {
        State::empty(Arc::new(Dimensions::quarto()))
            .with_placement(2, Cell::new(0, 1))
            .unwrap()
            .with_placement(7, Cell::new(3, 3))
            .unwrap()
            .with_given(5)
            .unwrap()
    }

    #[test]
    fn test_first_visit_is_its_own_representative() {
        let f = fixture();
        let state = state();
        let canonical = f.canonicalizer.canonicalize(&state).unwrap();
        assert_eq!(canonical.key(), state.key());
        assert!(canonical.transform.is_none());
        assert!(f.repo.peek(&state.key()).is_some());
        assert_eq!(f.repo.equivalence_count(), 1);
    }

    #[test]
    fn test_rotated_state_maps_to_stored_representative() {
        let f = fixture();
        let state = state();
        f.canonicalizer.canonicalize(&state).unwrap();

        let rotated = Rotation::new(1, 4).transform_state(&state).unwrap();
        let canonical = f.canonicalizer.canonicalize(&rotated).unwrap();
        assert_eq!(canonical.key(), state.key());
        let transform = canonical.transform.clone().unwrap();
        assert_eq!(transform.transform_state(&rotated).unwrap(), state);
        assert_eq!(f.repo.value_count(), 1);
    }

    #[test]
    fn test_canonicalization_is_stable() {
        let f = fixture();
        let rotated = Rotation::new(3, 4).transform_state(&state()).unwrap();
        f.canonicalizer.canonicalize(&state()).unwrap();

        let first = f.canonicalizer.canonicalize(&rotated).unwrap();
        let second = f.canonicalizer.canonicalize(&rotated).unwrap();
        assert_eq!(first.key(), second.key());
        assert_eq!(first.transform, second.transform);
    }

    #[test]
    fn test_actions_map_back_to_legal_original_moves() {
        let f = fixture();
        let state = state();
        f.canonicalizer.canonicalize(&state).unwrap();

        let rotated = Rotation::new(2, 4).transform_state(&state).unwrap();
        let canonical = f.canonicalizer.canonicalize(&rotated).unwrap();
        let legal = rotated.legal_actions().unwrap();
        for action in canonical.state.legal_actions().unwrap() {
            let original = canonical.to_original(&action);
            assert!(legal.iter().any(|a| a.same_move(&original)));
        }
    }

    #[test]
    fn test_unavailable_store_surfaces() {
        let f = fixture();
        f.repo.set_available(false);
        let error = f.canonicalizer.canonicalize(&state()).unwrap_err();
        assert!(error.is_store_unavailable());
        assert!(f.repo.keys().is_err());
        f.repo.set_available(true);
    }
}
