//! Configuration module for Issue-Pulse
//!
//! This module handles loading, parsing, and validating the TOML configuration file and
//! the credential environment variables.
//!
//! # Example
//!
//! ```no_run
//! use issue_pulse::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("issue-pulse.toml"))).unwrap();
//! println!("Talking to {}", config.api.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, CredentialsConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, load_config, load_config_with_env, ACCOUNT_ENV_VARS, TOKEN_ENV_VARS,
};
pub use validation::validate;
