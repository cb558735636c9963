//! Symmetry-aware learning memory for Quarto agents
//!
//! This crate provides:
//! - Quarto state and action codec with stable storage keys
//! - Rotation and attribute-permutation transforms with orbit enumeration
//! - Canonicalization of states onto one stored representative per orbit
//! - A two-tier value store (local map over a durable store) and an
//!   equivalence cache, shared by concurrent agents
//! - A background writer batching value updates into bulk upserts
//! - An epsilon-greedy temporal difference agent

pub mod adapters;
pub mod app;
pub mod cache;
pub mod error;
pub mod identifiers;
pub mod persistence;
pub mod ports;
pub mod q_learning;
pub mod quarto;
pub mod records;
pub mod types;

pub use app::{AgentConfig, App, AppConfig, StoreConfig};
pub use cache::Memory;
pub use error::{Error, Result};
pub use q_learning::ReasoningAgent;
pub use quarto::{Action, Cell, Dimensions, State, Transform};
pub use types::{Outcome, Value};
