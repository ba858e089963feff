//! HTTP surface
//!
//! - `/c/{token}`: tracked link redirect
//! - `/campaigns/{id}/...`: send, pause, resume and progress
//! - `/health`: liveness with database and store checks

pub mod response;
pub mod services;
