//! Mode routing
//!
//! - `server`: HTTP server plus job workers
//! - `worker`: job workers only
//! - `cli`: one-shot campaign commands

pub mod cli;
pub mod server;
pub mod worker;

pub use cli::run_cli;
pub use server::run_server;
pub use worker::run_worker;
