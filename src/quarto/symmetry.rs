//! Board symmetries: quarter-turn rotations and attribute permutations
//!
//! Every transform maps a state into another frame with `transform_state` and
//! maps an action found in that frame back into the original frame with
//! `transform_action`. Rotations only touch cells and permutations only touch
//! token identities, and each family is abelian, so chains commute and can be
//! folded left to right in both directions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    action::Action,
    board::{Cell, State},
    dimensions::{Dimensions, compose_token, decompose_token},
};
use crate::{Error, Result};

/// Rotation of the board by a number of counter-clockwise quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation {
    quarter_turns: u8,
    side: usize,
}

impl Rotation {
    /// Create a rotation; any turn count is reduced modulo 4.
    pub fn new(quarter_turns: i32, side: usize) -> Self {
        Self {
            quarter_turns: quarter_turns.rem_euclid(4) as u8,
            side,
        }
    }

    pub fn quarter_turns(&self) -> u8 {
        self.quarter_turns
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn is_identity(&self) -> bool {
        self.quarter_turns == 0
    }

    pub fn inverse(&self) -> Self {
        Self::new(-(self.quarter_turns as i32), self.side)
    }

    /// Where `cell` ends up after this rotation.
    pub fn rotate_cell(&self, cell: Cell) -> Cell {
        (0..self.quarter_turns).fold(cell, |c, _| Cell::new(self.side - 1 - c.col, c.row))
    }

    /// Rotate the materialized grid and flatten it back into slots.
    pub fn transform_state(&self, state: &State) -> Result<State> {
        if state.side() != self.side {
            return Err(Error::DimensionMismatch {
                transform: "rotation",
                expected: format!("side {}", self.side),
                got: format!("side {}", state.side()),
            });
        }
        let grid = (0..self.quarter_turns).fold(state.grid(), |grid, _| rotate_grid(&grid));
        state.with_grid(&grid)
    }

    /// Move the action's cell back through the inverse rotation.
    pub fn transform_action(&self, action: &Action) -> Action {
        Action {
            cell: self.inverse().rotate_cell(action.cell),
            ..*action
        }
    }
}

/// One counter-clockwise quarter turn: `new[i][j] = old[j][n - 1 - i]`.
fn rotate_grid(grid: &[Vec<Option<usize>>]) -> Vec<Vec<Option<usize>>> {
    let n = grid.len();
    (0..n)
        .map(|i| (0..n).map(|j| grid[j][n - 1 - i]).collect())
        .collect()
}

/// Cyclic shift of every attribute's value index.
///
/// For binary attributes the only non-trivial shift is a swap of the two values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permutation {
    shifts: Vec<usize>,
    sizes: Vec<usize>,
}

impl Permutation {
    /// Create a permutation for the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if there is not exactly one shift per
    /// attribute or a shift exceeds its attribute's domain.
    pub fn new(shifts: Vec<usize>, dimensions: &Dimensions) -> Result<Self> {
        let sizes = dimensions.sizes();
        if shifts.len() != sizes.len() || shifts.iter().zip(&sizes).any(|(s, d)| s >= d) {
            return Err(Error::DimensionMismatch {
                transform: "permutation",
                expected: format!("shifts within {sizes:?}"),
                got: format!("{shifts:?}"),
            });
        }
        Ok(Self { shifts, sizes })
    }

    pub fn identity(dimensions: &Dimensions) -> Self {
        Self {
            shifts: vec![0; dimensions.side()],
            sizes: dimensions.sizes(),
        }
    }

    pub fn shifts(&self) -> &[usize] {
        &self.shifts
    }

    pub fn is_identity(&self) -> bool {
        self.shifts.iter().all(|&s| s == 0)
    }

    pub fn inverse(&self) -> Self {
        let shifts = self
            .shifts
            .iter()
            .zip(&self.sizes)
            .map(|(&s, &d)| (d - s) % d)
            .collect();
        Self {
            shifts,
            sizes: self.sizes.clone(),
        }
    }

    /// Token id after shifting each attribute.
    pub fn permute_token(&self, token: usize) -> usize {
        let indices: Vec<usize> = decompose_token(token, &self.sizes)
            .iter()
            .zip(self.shifts.iter().zip(&self.sizes))
            .map(|(&idx, (&s, &d))| (idx + s) % d)
            .collect();
        compose_token(&indices, &self.sizes).unwrap_or(token)
    }

    /// Relabel every token: the status of token `t` moves to `permute_token(t)`.
    pub fn transform_state(&self, state: &State) -> Result<State> {
        let sizes = state.dimensions().sizes();
        if sizes != self.sizes {
            return Err(Error::DimensionMismatch {
                transform: "permutation",
                expected: format!("{:?}", self.sizes),
                got: format!("{sizes:?}"),
            });
        }
        let mut slots = state.slots().to_vec();
        for (token, slot) in state.slots().iter().enumerate() {
            slots[self.permute_token(token)] = *slot;
        }
        State::from_slots(Arc::clone(state.dimensions()), slots)
    }

    /// Map the placed and handed-back tokens through the inverse permutation.
    pub fn transform_action(&self, action: &Action) -> Action {
        let inverse = self.inverse();
        Action {
            token: inverse.permute_token(action.token),
            returned: action.returned.map(|token| inverse.permute_token(token)),
            ..*action
        }
    }
}

/// A composable, invertible board symmetry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum Transform {
    Rotation(Rotation),
    Permutation(Permutation),
    Chain(Vec<Transform>),
}

impl Transform {
    /// Map `state` into this transform's frame.
    pub fn transform_state(&self, state: &State) -> Result<State> {
        match self {
            Transform::Rotation(rotation) => rotation.transform_state(state),
            Transform::Permutation(permutation) => permutation.transform_state(state),
            Transform::Chain(transforms) => transforms
                .iter()
                .try_fold(state.clone(), |state, t| t.transform_state(&state)),
        }
    }

    /// Map an action found in this transform's frame back to the original frame.
    pub fn transform_action(&self, action: &Action) -> Action {
        match self {
            Transform::Rotation(rotation) => rotation.transform_action(action),
            Transform::Permutation(permutation) => permutation.transform_action(action),
            Transform::Chain(transforms) => transforms
                .iter()
                .fold(*action, |action, t| t.transform_action(&action)),
        }
    }

    pub fn inverse(&self) -> Transform {
        match self {
            Transform::Rotation(rotation) => Transform::Rotation(rotation.inverse()),
            Transform::Permutation(permutation) => Transform::Permutation(permutation.inverse()),
            Transform::Chain(transforms) => {
                Transform::Chain(transforms.iter().rev().map(Transform::inverse).collect())
            }
        }
    }

    /// Apply `self`, then `next`.
    pub fn then(self, next: Transform) -> Transform {
        let mut transforms = match self {
            Transform::Chain(transforms) => transforms,
            other => vec![other],
        };
        match next {
            Transform::Chain(more) => transforms.extend(more),
            other => transforms.push(other),
        }
        Transform::Chain(transforms)
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Transform::Rotation(rotation) => rotation.is_identity(),
            Transform::Permutation(permutation) => permutation.is_identity(),
            Transform::Chain(transforms) => transforms.iter().all(Transform::is_identity),
        }
    }
}

/// Every transform of the symmetry orbit: each attribute-shift choice combined
/// with each of the four rotations.
///
/// Shift choices are enumerated with the first attribute varying slowest, and
/// the identity comes first. Duplicate images are not removed.
pub fn orbit(dimensions: &Dimensions) -> Vec<Transform> {
    let sizes = dimensions.sizes();
    let side = dimensions.side();
    let total: usize = sizes.iter().product();

    let mut transforms = Vec::with_capacity(total * 4);
    for choice in 0..total {
        let permutation = Permutation {
            shifts: decompose_token(choice, &sizes),
            sizes: sizes.clone(),
        };
        for quarter_turns in 0..4 {
            transforms.push(Transform::Chain(vec![
                Transform::Permutation(permutation.clone()),
                Transform::Rotation(Rotation::new(quarter_turns, side)),
            ]));
        }
    }
    transforms
}

/// Pair every orbit transform with the image of `state` under it.
pub fn orbit_states(state: &State) -> Result<Vec<(Transform, State)>> {
    orbit(state.dimensions())
        .into_iter()
        .map(|transform| {
            let image = transform.transform_state(state)?;
            Ok((transform, image))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quarto::Attribute;

    fn quarto() -> Arc<Dimensions> {
        Arc::new(Dimensions::quarto())
    }

    fn sample_state() -> State {
        State::empty(quarto())
            .with_placement(0, Cell::new(0, 1))
            .unwrap()
            .with_placement(5, Cell::new(2, 3))
            .unwrap()
            .with_placement(9, Cell::new(3, 0))
            .unwrap()
            .with_given(12)
            .unwrap()
    }

    #[test]
    fn test_four_quarter_turns_is_identity() {
        let state = sample_state();
        let rotation = Rotation::new(4, 4);
        assert!(rotation.is_identity());
        assert_eq!(rotation.transform_state(&state).unwrap().key(), state.key());

        let once = Rotation::new(1, 4);
        let mut rotated = state.clone();
        for _ in 0..4 {
            rotated = once.transform_state(&rotated).unwrap();
        }
        assert_eq!(rotated.key(), state.key());
    }

    #[test]
    fn test_rotation_moves_cells_on_the_grid() {
        let state = sample_state();
        let rotated = Rotation::new(1, 4).transform_state(&state).unwrap();
        // (0, 1) -> (n - 1 - 1, 0)
        assert_eq!(rotated.token_at(Cell::new(2, 0)), Some(0));
        assert_eq!(rotated.token_at(Cell::new(0, 2)), Some(5));
        assert_eq!(rotated.token_at(Cell::new(3, 3)), Some(9));
        assert_eq!(rotated.given_token(), Some(12));
    }

    #[test]
    fn test_rotation_cell_matches_grid() {
        let rotation = Rotation::new(3, 4);
        let state = sample_state();
        let rotated = rotation.transform_state(&state).unwrap();
        assert_eq!(
            rotated.token_at(rotation.rotate_cell(Cell::new(2, 3))),
            Some(5)
        );
    }

    #[test]
    fn test_permutation_relabels_every_slot() {
        let dims = quarto();
        let permutation = Permutation::new(vec![1, 0, 0, 1], &dims).unwrap();
        let state = sample_state();
        let permuted = permutation.transform_state(&state).unwrap();
        for token in 0..16 {
            assert_eq!(
                permuted.slot(permutation.permute_token(token)).unwrap(),
                state.slot(token).unwrap()
            );
        }
        // token 0 = [0,0,0,0] -> [1,0,0,1] = 9
        assert_eq!(permutation.permute_token(0), 9);
    }

    #[test]
    fn test_permutation_action_uses_inverse() {
        let dims = quarto();
        let permutation = Permutation::new(vec![1, 1, 0, 0], &dims).unwrap();
        let action = Action::new(permutation.permute_token(3), Cell::new(1, 1), Some(7));
        let restored = permutation.transform_action(&action);
        assert_eq!(restored.token, 3);
        assert_eq!(restored.cell, Cell::new(1, 1));
        assert_eq!(permutation.permute_token(restored.returned.unwrap()), 7);
    }

    #[test]
    fn test_orbit_size() {
        let dims = quarto();
        let transforms = orbit(&dims);
        assert_eq!(transforms.len(), 64);
        assert!(transforms[0].is_identity());
    }

    #[test]
    fn test_orbit_closure() {
        let state = sample_state();
        for (transform, image) in orbit_states(&state).unwrap() {
            let back = transform.inverse().transform_state(&image).unwrap();
            assert_eq!(back.key(), state.key(), "{transform:?}");
        }
    }

    #[test]
    fn test_actions_map_back_to_legal_original_actions() {
        let state = sample_state();
        let legal: Vec<Action> = state.legal_actions().unwrap();
        for (transform, image) in orbit_states(&state).unwrap() {
            for action in image.legal_actions().unwrap().iter().step_by(17) {
                let original = transform.transform_action(action);
                assert!(
                    legal.iter().any(|a| a.same_move(&original)),
                    "{original} is not legal in the original frame"
                );
            }
        }
    }

    #[test]
    fn test_chain_inverse_roundtrip() {
        let dims = quarto();
        let chain = Transform::Permutation(Permutation::new(vec![0, 1, 1, 0], &dims).unwrap())
            .then(Transform::Rotation(Rotation::new(3, 4)))
            .then(Transform::Rotation(Rotation::new(2, 4)));
        let state = sample_state();
        let image = chain.transform_state(&state).unwrap();
        assert_eq!(chain.inverse().transform_state(&image).unwrap(), state);
    }

    #[test]
    fn test_dimension_mismatch() {
        let small = Dimensions::new(vec![
            Attribute::new("a", &["x", "y", "z"]),
            Attribute::new("b", &["p", "q"]),
        ])
        .unwrap();
        let permutation = Permutation::new(vec![1, 1], &small).unwrap();
        assert!(matches!(
            permutation.transform_state(&sample_state()),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Rotation::new(1, 2).transform_state(&sample_state()),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(Permutation::new(vec![2, 0, 0, 0], &Dimensions::quarto()).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let transform = Transform::Rotation(Rotation::new(1, 4));
        let json = serde_json::to_value(&transform).unwrap();
        assert_eq!(json["kind"], "rotation");
        assert_eq!(json["params"]["quarter_turns"], 1);
    }
}
