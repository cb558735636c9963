//! Asynchronous persistence of value-record updates.

pub mod writer;

pub use writer::{BatchWriter, WriterSettings, WriterStats};
