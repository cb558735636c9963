//! Moves recorded during one game.

use crate::quarto::{Action, State};

/// One decision: the canonical state, the action chosen in it and the state
/// the action leads to.
#[derive(Debug, Clone)]
pub struct Step {
    pub state: State,
    pub action: Action,
    pub next_state: State,
}

/// Ordered decisions of the current game.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    steps: Vec<Step>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `action` taken in `state`.
    pub fn record(&mut self, state: State, action: Action) {
        let next_state = state.successor(&action);
        self.steps.push(Step {
            state,
            action,
            next_state,
        });
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Hand the recorded steps over, leaving the trajectory empty.
    pub fn take(&mut self) -> Vec<Step> {
        std::mem::take(&mut self.steps)
    }

    /// Put back `steps` that were taken but not yet learned from.
    ///
    /// They go in front of anything recorded since, keeping play order.
    pub fn restore(&mut self, mut steps: Vec<Step>) {
        steps.append(&mut self.steps);
        self.steps = steps;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::quarto::{Cell, Dimensions, Slot};

    #[test]
    fn test_post_state_places_token_without_marking_returned() {
        let state = State::empty(Arc::new(Dimensions::quarto()))
            .with_given(3)
            .unwrap();
        let action = Action::new(3, Cell::new(2, 1), Some(9));

        let mut trajectory = Trajectory::new();
        trajectory.record(state, action);

        let step = &trajectory.steps()[0];
        assert_eq!(step.next_state.slots()[3], Slot::Placed(Cell::new(2, 1)));
        assert_eq!(step.next_state.slots()[9], Slot::Unplaced);
        assert_eq!(step.next_state.given_token(), None);
    }

    #[test]
    fn test_take_empties() {
        let state = State::empty(Arc::new(Dimensions::quarto()))
            .with_given(0)
            .unwrap();
        let mut trajectory = Trajectory::new();
        trajectory.record(state.clone(), Action::new(0, Cell::new(0, 0), Some(1)));
        trajectory.record(state, Action::new(0, Cell::new(1, 0), Some(2)));

        assert_eq!(trajectory.take().len(), 2);
        assert!(trajectory.is_empty());
    }

    #[test]
    fn test_restore_goes_before_newer_steps() {
        let state = State::empty(Arc::new(Dimensions::quarto()))
            .with_given(0)
            .unwrap();
        let mut trajectory = Trajectory::new();
        trajectory.record(state.clone(), Action::new(0, Cell::new(0, 0), Some(1)));
        trajectory.record(state.clone(), Action::new(0, Cell::new(1, 0), Some(2)));

        let taken = trajectory.take();
        trajectory.record(state, Action::new(0, Cell::new(3, 3), Some(4)));
        trajectory.restore(taken[1..].to_vec());

        let cells: Vec<Cell> = trajectory.steps().iter().map(|s| s.action.cell).collect();
        assert_eq!(cells, vec![Cell::new(1, 0), Cell::new(3, 3)]);
    }
}
