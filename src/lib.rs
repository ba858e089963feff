//! mailshot - bulk email campaign dispatcher
//!
//! Sends campaigns to large recipient lists in bounded chunks, caps how many
//! chunks are in flight across a worker pool, supports cooperative
//! pause/resume, and records link clicks idempotently.
//!
//! # Architecture
//! - `store`: shared key-value store (Redis or in-process)
//! - `dispatch`: recipient queue, lock, inflight counter, coordinator, chunk worker
//! - `jobs`: job queue and worker pool
//! - `mail`: message building and transports
//! - `tracking`: redirect click ingestion
//! - `storage`: relational storage via sea-orm
//! - `services`: campaign kickoff / pause / resume
//! - `api`: HTTP routes
//! - `config`: configuration management
//! - `runtime`: application wiring and execution modes
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod jobs;
pub mod mail;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod store;
pub mod system;
pub mod tracking;
pub mod utils;
