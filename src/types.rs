//! Newtype wrappers for learned values, rewards and game outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A learned action value, always inside the reward domain `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Value(f64);

impl Value {
    pub const MIN: f64 = -1.0;
    pub const MAX: f64 = 1.0;

    /// Create a value, clamping it into `[-1, 1]`.
    ///
    /// NaN collapses to zero so a corrupted update cannot poison a record.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Value(0.0);
        }
        Value(value.clamp(Self::MIN, Self::MAX))
    }

    /// The neutral starting value of every freshly enumerated action.
    pub const fn zero() -> Self {
        Value(0.0)
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::new(value)
    }
}

impl From<Value> for f64 {
    fn from(value: Value) -> Self {
        value.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Terminal reward of a game: exactly one of `+1`, `-1` or `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reward(f64);

impl Reward {
    pub const WIN: Reward = Reward(1.0);
    pub const LOSS: Reward = Reward(-1.0);
    pub const TIE: Reward = Reward(0.0);

    /// Validate a raw reward.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReward`] for anything other than `1.0`, `-1.0` or `0.0`.
    pub fn new(reward: f64) -> Result<Self> {
        if reward == 1.0 || reward == -1.0 || reward == 0.0 {
            Ok(Reward(reward))
        } else {
            Err(Error::InvalidReward { reward })
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// Result of a finished game from the learner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    pub fn reward(self) -> Reward {
        match self {
            Outcome::Win => Reward::WIN,
            Outcome::Loss => Reward::LOSS,
            Outcome::Tie => Reward::TIE,
        }
    }
}

impl TryFrom<i32> for Outcome {
    type Error = Error;

    /// Map the game layer's integer result (`1`, `-1`, `0`).
    fn try_from(result: i32) -> Result<Self> {
        match result {
            1 => Ok(Outcome::Win),
            -1 => Ok(Outcome::Loss),
            0 => Ok(Outcome::Tie),
            other => Err(Error::InvalidReward {
                reward: other as f64,
            }),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Tie => "tie",
        };
        f.write_str(label)
    }
}
