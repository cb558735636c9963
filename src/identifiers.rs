//! Storage identifiers for states and actions.
//!
//! Keys are the canonical textual encodings produced by the codec in
//! [`crate::quarto`]. Two keys are equal exactly when the encoded values are
//! equal, so a key can be used directly as the durable-store identity.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Encoded identity of a board state.
///
/// Produced by [`State::key`](crate::quarto::State::key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// Wrap an already-encoded state key.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarto_memory::identifiers::StateKey;
    ///
    /// let key = StateKey::new("*,_,0.1");
    /// assert_eq!(key.as_str(), "*,_,0.1");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the key into its inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for StateKey {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Borrow<str> for StateKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for StateKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for StateKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for StateKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Encoded identity of an action (placed token, cell, handed-back token).
///
/// Produced by [`Action::key`](crate::quarto::Action::key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionKey(String);

impl ActionKey {
    /// Wrap an already-encoded action key.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarto_memory::identifiers::ActionKey;
    ///
    /// let key = ActionKey::new("0,1,2,5");
    /// assert_eq!(key.as_str(), "0,1,2,5");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for ActionKey {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Borrow<str> for ActionKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for ActionKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ActionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for ActionKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
