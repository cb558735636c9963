//! Persisted record shapes shared by the caches and the durable store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    identifiers::{ActionKey, StateKey},
    quarto::{Action, Dimensions, Slot, State, Transform},
    types::Value,
};

/// Learned values of every legal action of one canonical state.
///
/// Actions keep their enumeration order so ties between equal values resolve
/// the same way every time the record is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub key: StateKey,
    pub raw_state: Vec<Slot>,
    pub action_values: Vec<(ActionKey, Value)>,
}

impl ValueRecord {
    /// Fresh record for `state` with the given actions at their current values.
    pub fn new(state: &State, actions: &[Action]) -> Self {
        Self {
            key: state.key(),
            raw_state: state.slots().to_vec(),
            action_values: actions
                .iter()
                .map(|action| (action.key(), action.value))
                .collect(),
        }
    }

    pub fn get(&self, action: &ActionKey) -> Option<Value> {
        self.action_values
            .iter()
            .find(|(key, _)| key == action)
            .map(|(_, value)| *value)
    }

    /// Overwrite one action's value; returns false if the action is unknown.
    pub fn set(&mut self, action: &ActionKey, value: Value) -> bool {
        match self.action_values.iter_mut().find(|(key, _)| key == action) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Highest value among the actions, if there are any.
    pub fn best_value(&self) -> Option<Value> {
        self.action_values
            .iter()
            .map(|(_, value)| *value)
            .reduce(|best, value| if value > best { value } else { best })
    }

    /// Decode every action with its value attached.
    pub fn actions(&self, dimensions: &Dimensions) -> Result<Vec<Action>> {
        self.action_values
            .iter()
            .map(|(key, value)| Ok(Action::from_key(key, dimensions)?.with_value(*value)))
            .collect()
    }

    pub fn state(&self, dimensions: Arc<Dimensions>) -> Result<State> {
        State::from_slots(dimensions, self.raw_state.clone())
    }
}

/// Memoized canonicalization of one state.
///
/// `transform` maps the original state onto the representative; `None` means
/// the state is its own representative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceRecord {
    pub key: StateKey,
    pub representative_key: StateKey,
    pub transform: Option<Transform>,
}
