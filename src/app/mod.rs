//! Application layer with dependency injection container.
//!
//! The container owns infrastructure dependencies and provides factory
//! methods for creating agents that share one learning memory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           Application Layer (app)           │
//! │  ┌──────────────────────────────────────┐   │
//! │  │       App (DI Container)             │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ owns                       │
//! │                 ▼                            │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Infrastructure (adapters)           │   │
//! │  │  - MsgPackStore                      │   │
//! │  │  - InMemoryStore (testing)           │   │
//! │  │  - BatchWriter                       │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ implements                 │
//! │                 ▼                            │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Ports (ports)                │   │
//! │  │  - ValueRepository                   │   │
//! │  │  - EquivalenceRepository             │   │
//! │  └──────────────┬───────────────────────┘   │
//! │                 │ used by                    │
//! │                 ▼                            │
//! │  ┌──────────────────────────────────────┐   │
//! │  │  Domain Logic                        │   │
//! │  │  - Memory (caches, canonicalizer)    │   │
//! │  │  - ReasoningAgent                    │   │
//! │  └──────────────────────────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use quarto_memory::app::{AgentConfig, App};
//! use quarto_memory::adapters::InMemoryStore;
//!
//! let app = App::for_testing()
//!     .with_repository(InMemoryStore::new())
//!     .with_default_seed(42)
//!     .build()?;
//! let agent = app.create_agent(AgentConfig::new("alice"))?;
//! # Ok::<(), quarto_memory::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::{AgentConfig, AppConfig, StoreConfig};
pub use container::{App, AppBuilder};
