//! Service layer for business logic
//!
//! Shared between the HTTP handlers and the CLI.

mod campaign;

pub use campaign::*;
