//! Learner port - the surface the game loop drives
//!
//! The game layer owns the rules; a learner only answers "which move?" at each
//! decision point and is told the outcome once the game is over.

use crate::{
    Result,
    quarto::{Action, Cell},
    types::Outcome,
};

/// Interface between the game loop and a learning player.
///
/// # Examples
///
/// ```no_run
/// use quarto_memory::{ports::Learner, quarto::Cell, types::Outcome};
///
/// fn play_opening<L: Learner>(learner: &mut L) -> quarto_memory::Result<()> {
///     let board: Vec<Option<Cell>> = vec![None; 16];
///     let action = learner.select_action(&board, 0)?;
///     println!("place at {}, hand over {:?}", action.cell, action.returned);
///     learner.apply_outcome(Outcome::Tie)
/// }
/// ```
pub trait Learner: Send {
    /// Choose a move at a decision point.
    ///
    /// `board` holds one optional cell per token id and `given_token` is the
    /// token the opponent handed over. The returned action is expressed in the
    /// caller's coordinates and token ids.
    fn select_action(&mut self, board: &[Option<Cell>], given_token: usize) -> Result<Action>;

    /// Learn from the finished game.
    fn apply_outcome(&mut self, outcome: Outcome) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str;

    /// Drop any partially recorded game without learning from it.
    fn reset_trajectory(&mut self) -> Result<()> {
        Ok(())
    }
}
