//! # CLI Module
//!
//! The `routeshim` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Load configuration and route files, then serve until SIGINT/SIGTERM:
//!
//! ```bash
//! routeshim serve --addr 0.0.0.0:8080
//! ```
//!
//! ### `routes`
//!
//! Print the route table in match order:
//!
//! ```bash
//! routeshim routes
//! ```
//!
//! ### `check`
//!
//! Verify that every route's handler and middleware resolve; exits non-zero otherwise.
//!
//! Every command accepts `--config <FILE>` (default `config/app.yaml`) and
//! `--env-file <FILE>` (default `.env`). Missing files are skipped.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{format_route_table, run_cli, Cli, Commands};
