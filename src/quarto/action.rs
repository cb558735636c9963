//! Action codec: placed token, destination cell and handed-back token

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{board::Cell, dimensions::Dimensions};
use crate::{Error, Result, identifiers::ActionKey, types::Value};

const NO_TOKEN: &str = "-";

/// One move: place `token` on `cell`, then hand `returned` to the opponent.
///
/// `returned` is `None` exactly when no token is left to give. The attached
/// value is the learned estimate for this action in the state it was taken
/// from and never leaves `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub token: usize,
    pub cell: Cell,
    pub returned: Option<usize>,
    pub value: Value,
}

impl Action {
    pub fn new(token: usize, cell: Cell, returned: Option<usize>) -> Self {
        Self {
            token,
            cell,
            returned,
            value: Value::zero(),
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Same token, cell and returned token, regardless of value.
    pub fn same_move(&self, other: &Action) -> bool {
        self.token == other.token && self.cell == other.cell && self.returned == other.returned
    }

    /// Canonical text encoding: `token,row,col,returned` with `-` for no return.
    pub fn key(&self) -> ActionKey {
        let returned = self
            .returned
            .map_or_else(|| NO_TOKEN.to_string(), |token| token.to_string());
        ActionKey::new(format!(
            "{},{},{},{}",
            self.token, self.cell.row, self.cell.col, returned
        ))
    }

    /// Decode an action key, checking every field against `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] on a wrong field count, a non-numeric field, a
    /// token or cell outside the game described by `dimensions`, or text that
    /// would not be produced by [`Action::key`].
    pub fn decode(encoded: &str, dimensions: &Dimensions) -> Result<Self> {
        let fields: Vec<&str> = encoded.split(',').collect();
        let [token, row, col, returned] = fields.as_slice() else {
            return Err(Error::decode(
                "action",
                encoded,
                format!("expected 4 fields, got {}", fields.len()),
            ));
        };

        let number = |field: &str, name: &str| {
            field
                .parse::<usize>()
                .map_err(|e| Error::decode("action", encoded, format!("{name}: {e}")))
        };
        let token = number(token, "token")?;
        let cell = Cell::new(number(row, "row")?, number(col, "col")?);
        let returned = match *returned {
            NO_TOKEN => None,
            field => Some(number(field, "returned token")?),
        };

        let count = dimensions.token_count();
        if token >= count || returned.is_some_and(|r| r >= count) {
            return Err(Error::decode(
                "action",
                encoded,
                format!("token out of range (game has {count} tokens)"),
            ));
        }
        if cell.check(dimensions.side()).is_err() {
            return Err(Error::decode(
                "action",
                encoded,
                format!("cell {cell} is off the board"),
            ));
        }

        let action = Self::new(token, cell, returned);
        if action.key().as_str() != encoded {
            return Err(Error::decode("action", encoded, "not in canonical form"));
        }
        Ok(action)
    }

    pub fn from_key(key: &ActionKey, dimensions: &Dimensions) -> Result<Self> {
        Self::decode(key.as_str(), dimensions)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key(), self.value)
    }
}
