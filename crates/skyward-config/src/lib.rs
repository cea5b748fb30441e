//! Configuration for Skyward sessions.
//!
//! Runtime-configurable settings persisted to disk as RON, with CLI
//! overrides via clap. Unknown fields are ignored and missing sections fall
//! back to defaults, so config files stay forward and backward compatible.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, Role};
pub use config::{Config, DebugConfig, NetworkConfig};
pub use error::ConfigError;
