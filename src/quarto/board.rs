//! Decision-point state: one slot per token, plus legal-action enumeration

use std::{collections::HashSet, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{action::Action, dimensions::Dimensions};
use crate::{Error, Result, identifiers::StateKey};

const UNPLACED: &str = "_";
const GIVEN: &str = "*";

/// A board cell addressed by row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub(crate) fn check(self, side: usize) -> Result<Self> {
        if self.row < side && self.col < side {
            Ok(self)
        } else {
            Err(Error::InvalidCell {
                row: self.row,
                col: self.col,
                side,
            })
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Status of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    Unplaced,
    /// The token handed to the player about to move.
    Given,
    Placed(Cell),
}

impl Slot {
    fn encode(self) -> String {
        match self {
            Slot::Unplaced => UNPLACED.to_string(),
            Slot::Given => GIVEN.to_string(),
            Slot::Placed(cell) => format!("{}.{}", cell.row, cell.col),
        }
    }

    fn decode(part: &str, key: &str) -> Result<Self> {
        match part {
            UNPLACED => Ok(Slot::Unplaced),
            GIVEN => Ok(Slot::Given),
            _ => {
                let (row, col) = part
                    .split_once('.')
                    .ok_or_else(|| Error::decode("state", key, format!("bad slot '{part}'")))?;
                let parse = |text: &str| {
                    text.parse::<usize>()
                        .map_err(|e| Error::decode("state", key, format!("bad slot '{part}': {e}")))
                };
                Ok(Slot::Placed(Cell::new(parse(row)?, parse(col)?)))
            }
        }
    }
}

/// Board state as seen by the player about to move.
///
/// Invariants: exactly `token_count` slots, at most one [`Slot::Given`], every
/// placed cell on the board and no cell shared by two tokens.
#[derive(Debug, Clone)]
pub struct State {
    dimensions: Arc<Dimensions>,
    slots: Vec<Slot>,
}

impl State {
    /// A board with no token placed and none given.
    pub fn empty(dimensions: Arc<Dimensions>) -> Self {
        let slots = vec![Slot::Unplaced; dimensions.token_count()];
        Self { dimensions, slots }
    }

    /// Build a state from raw slots, validating every invariant.
    pub fn from_slots(dimensions: Arc<Dimensions>, slots: Vec<Slot>) -> Result<Self> {
        if slots.len() != dimensions.token_count() {
            return Err(Error::InvalidState {
                message: format!(
                    "expected {} slots, got {}",
                    dimensions.token_count(),
                    slots.len()
                ),
            });
        }

        let side = dimensions.side();
        let mut given = 0;
        let mut occupied = HashSet::new();
        for slot in &slots {
            match slot {
                Slot::Unplaced => {}
                Slot::Given => given += 1,
                Slot::Placed(cell) => {
                    cell.check(side)?;
                    if !occupied.insert(*cell) {
                        return Err(Error::InvalidState {
                            message: format!("cell {cell} holds more than one token"),
                        });
                    }
                }
            }
        }
        if given > 1 {
            return Err(Error::InvalidState {
                message: format!("{given} tokens are marked as given"),
            });
        }

        Ok(Self { dimensions, slots })
    }

    /// Build a state from the game layer's board: one optional cell per token id.
    pub fn from_board(dimensions: Arc<Dimensions>, board: &[Option<Cell>]) -> Result<Self> {
        let slots = board
            .iter()
            .map(|cell| cell.map_or(Slot::Unplaced, Slot::Placed))
            .collect();
        Self::from_slots(dimensions, slots)
    }

    /// Decode a state from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed slots and the usual state
    /// validation errors for well-formed keys describing impossible boards.
    pub fn from_key(dimensions: Arc<Dimensions>, key: &str) -> Result<Self> {
        let slots = key
            .split(',')
            .map(|part| Slot::decode(part, key))
            .collect::<Result<Vec<_>>>()?;
        let state = Self::from_slots(dimensions, slots)?;
        if state.key().as_str() != key {
            return Err(Error::decode("state", key, "not in canonical form"));
        }
        Ok(state)
    }

    /// Deterministic, order-preserving encoding of the slots.
    pub fn key(&self) -> StateKey {
        let parts: Vec<String> = self.slots.iter().map(|slot| slot.encode()).collect();
        StateKey::new(parts.join(","))
    }

    pub fn dimensions(&self) -> &Arc<Dimensions> {
        &self.dimensions
    }

    pub fn side(&self) -> usize {
        self.dimensions.side()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, token: usize) -> Result<Slot> {
        self.dimensions.check_token(token)?;
        Ok(self.slots[token])
    }

    pub fn given_token(&self) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Slot::Given)
    }

    /// Mark `token` as the one handed to the player about to move.
    ///
    /// Any previously given token returns to the unplaced pool.
    pub fn with_given(&self, token: usize) -> Result<Self> {
        match self.slot(token)? {
            Slot::Placed(cell) => Err(Error::InvalidState {
                message: format!("token {token} is already placed at {cell}"),
            }),
            _ => {
                let mut slots = self.slots.clone();
                for slot in slots.iter_mut().filter(|slot| **slot == Slot::Given) {
                    *slot = Slot::Unplaced;
                }
                slots[token] = Slot::Given;
                Ok(Self {
                    dimensions: Arc::clone(&self.dimensions),
                    slots,
                })
            }
        }
    }

    /// Place `token` on `cell`.
    pub fn with_placement(&self, token: usize, cell: Cell) -> Result<Self> {
        self.dimensions.check_token(token)?;
        cell.check(self.side())?;
        if let Some(owner) = self.token_at(cell).filter(|&owner| owner != token) {
            return Err(Error::InvalidState {
                message: format!("cell {cell} is already taken by token {owner}"),
            });
        }
        let mut slots = self.slots.clone();
        slots[token] = Slot::Placed(cell);
        Ok(Self {
            dimensions: Arc::clone(&self.dimensions),
            slots,
        })
    }

    /// State after playing `action`: the acted-upon token lands on its cell.
    ///
    /// The handed-back token is not marked as given. A placeholder action whose
    /// cell is already occupied only clears the given marker.
    pub fn successor(&self, action: &Action) -> Self {
        match self.with_placement(action.token, action.cell) {
            Ok(next) => next,
            Err(_) => {
                let mut slots = self.slots.clone();
                for slot in slots.iter_mut().filter(|slot| **slot == Slot::Given) {
                    *slot = Slot::Unplaced;
                }
                Self {
                    dimensions: Arc::clone(&self.dimensions),
                    slots,
                }
            }
        }
    }

    /// Token occupying `cell`, if any.
    pub fn token_at(&self, cell: Cell) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| *slot == Slot::Placed(cell))
    }

    /// Free cells in row-major order.
    pub fn free_cells(&self) -> Vec<Cell> {
        let occupied: HashSet<Cell> = self
            .slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Placed(cell) => Some(*cell),
                _ => None,
            })
            .collect();
        let side = self.side();
        (0..side)
            .flat_map(|row| (0..side).map(move |col| Cell::new(row, col)))
            .filter(|cell| !occupied.contains(cell))
            .collect()
    }

    /// Tokens that are neither placed nor given, ascending.
    pub fn remaining_tokens(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot == Slot::Unplaced)
            .map(|(token, _)| token)
            .collect()
    }

    /// Every legal action for the player holding the given token, each valued 0.
    ///
    /// Cells are enumerated row-major, handed-back tokens ascending. When no
    /// token is left to hand back, each free cell yields an action without a
    /// returned token; with no free cell at all a single placeholder at the
    /// origin is produced so callers never see an empty action set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoGivenToken`] if no token is marked as given.
    pub fn legal_actions(&self) -> Result<Vec<Action>> {
        let token = self.given_token().ok_or_else(|| Error::NoGivenToken {
            state: self.key().into_inner(),
        })?;
        let free = self.free_cells();
        let remaining = self.remaining_tokens();

        if free.is_empty() {
            return Ok(vec![Action::new(token, Cell::new(0, 0), None)]);
        }
        if remaining.is_empty() {
            return Ok(free
                .into_iter()
                .map(|cell| Action::new(token, cell, None))
                .collect());
        }

        Ok(free
            .iter()
            .flat_map(|&cell| {
                remaining
                    .iter()
                    .map(move |&returned| Action::new(token, cell, Some(returned)))
            })
            .collect())
    }

    /// Materialize the board as a grid of token ids.
    pub fn grid(&self) -> Vec<Vec<Option<usize>>> {
        let side = self.side();
        let mut grid = vec![vec![None; side]; side];
        for (token, slot) in self.slots.iter().enumerate() {
            if let Slot::Placed(cell) = slot {
                grid[cell.row][cell.col] = Some(token);
            }
        }
        grid
    }

    /// Rebuild a state from a grid of token ids, keeping this state's given token.
    pub(crate) fn with_grid(&self, grid: &[Vec<Option<usize>>]) -> Result<Self> {
        let mut slots: Vec<Slot> = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Given => Slot::Given,
                _ => Slot::Unplaced,
            })
            .collect();
        for (row, line) in grid.iter().enumerate() {
            for (col, token) in line.iter().enumerate() {
                if let Some(token) = token {
                    self.dimensions.check_token(*token)?;
                    slots[*token] = Slot::Placed(Cell::new(row, col));
                }
            }
        }
        Self::from_slots(Arc::clone(&self.dimensions), slots)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
            && (Arc::ptr_eq(&self.dimensions, &other.dimensions)
                || self.dimensions == other.dimensions)
    }
}

impl Eq for State {}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.dimensions.side();
        let name = |token: usize| {
            self.dimensions
                .token_name(token)
                .unwrap_or_else(|_| "?".repeat(width))
        };
        for line in self.grid() {
            let cells: Vec<String> = line
                .iter()
                .map(|token| token.map_or_else(|| " ".repeat(width), name))
                .collect();
            writeln!(f, "| {} |", cells.join(" | "))?;
        }
        match self.given_token() {
            Some(token) => write!(f, "given: {}", name(token)),
            None => write!(f, "given: -"),
        }
    }
}
