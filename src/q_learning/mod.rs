//! Temporal difference learning over canonical Quarto states
//!
//! An agent plays epsilon-greedily on the canonical representative of each
//! decision point and records its moves. When the game ends the terminal
//! reward is propagated over the whole trajectory in one pass:
//!
//! ```text
//! Q(s, a) ← (1 − α)·Q(s, a) + α·(r + γ^(n − i)·max Q(s′, ·))
//! ```
//!
//! where `i` is the step index and `n` the trajectory length. Earlier moves
//! receive the larger exponent.
//!
//! ## Usage Example
//!
//! ```
//! use quarto_memory::app::{AgentConfig, App};
//! use quarto_memory::types::Outcome;
//! use quarto_memory::ports::Learner;
//!
//! let app = App::for_testing().with_default_seed(7).build()?;
//! let mut agent = app.create_agent(AgentConfig::new("alice"))?;
//!
//! let action = agent.select_action(&[None; 16], 0)?;
//! assert_ne!(action.returned, Some(0));
//! agent.apply_outcome(Outcome::Win)?;
//! app.shutdown()?;
//! # Ok::<(), quarto_memory::Error>(())
//! ```

pub mod agent;
pub mod trajectory;

pub use agent::ReasoningAgent;
pub use trajectory::{Step, Trajectory};
