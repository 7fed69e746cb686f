//! Lambda entry point for the relay dispatcher.
//!
//! The binary in `main.rs` loads [`config::RelayConfig`], installs logging
//! and hands every SNS invocation to [`handler::handle`].

pub mod config;
pub mod handler;
pub mod telemetry;
