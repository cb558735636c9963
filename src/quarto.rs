//! Quarto state model, codec and symmetry algebra
//!
//! Turn-by-turn rules and win detection live with the caller; this module only
//! knows how to describe a decision point (which tokens sit where, which token
//! was handed over) and how the board's symmetries act on it.

pub mod action;
pub mod board;
pub mod dimensions;
pub mod symmetry;

pub use action::Action;
pub use board::{Cell, Slot, State};
pub use dimensions::{Attribute, Dimensions};
pub use symmetry::{Permutation, Rotation, Transform, orbit, orbit_states};
