//! Configuration loading.
//!
//! - [`loader`] - selects and parses one environment block from a context file

mod loader;

pub use loader::{list_environments, load_environment, parse_environment};

/// Default context file name, as used by `cdk synth`.
pub const DEFAULT_CONFIG_FILE: &str = "cdk.json";
