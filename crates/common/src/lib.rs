//! Shared model for the pear toolchain wrapper: template environment,
//! per-command rewrite rules and configuration loading.

pub mod command;
pub mod config;
pub mod environment;
pub mod paths;

pub use command::{filter_out, Command, MissingExecutable};
pub use config::{Config, ConfigError, StringOrList};
pub use environment::Environment;
