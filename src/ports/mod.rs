//! Ports (trait boundaries) for external dependencies.
//!
//! These traits are owned by the domain and implemented by adapters in the
//! infrastructure layer: durable storage below, the game loop above.

pub mod learner;
pub mod repository;

pub use learner::Learner;
pub use repository::{EquivalenceRepository, ValueRepository};
