//! Runtime module
//!
//! Application wiring, lifecycle and execution modes:
//! - `context`: the assembled components shared by every mode
//! - `lifetime`: startup and graceful shutdown
//! - `modes`: server, worker and one-shot CLI commands

pub mod context;
pub mod lifetime;
pub mod modes;

pub use context::AppContext;
