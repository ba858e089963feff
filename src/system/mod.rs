//! System-level modules
//!
//! - `logging`: tracing subscriber setup

pub mod logging;
