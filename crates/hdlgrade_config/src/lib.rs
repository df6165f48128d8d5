//! Parsing and validation of `hdlgrade.toml` configuration files.
//!
//! This crate reads the optional configuration file and produces a
//! strongly-typed [`HdlgradeConfig`]. Command-line flags override its values.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, resolve_config, CONFIG_FILE_NAME};
pub use types::*;
