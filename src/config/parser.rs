use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Environment variables consulted for the account name, in priority order
pub const ACCOUNT_ENV_VARS: &[&str] = &["ISSUE_PULSE_ACCOUNT", "account"];

/// Environment variables consulted for the access token, in priority order
pub const TOKEN_ENV_VARS: &[&str] = &["ISSUE_PULSE_TOKEN", "token"];

/// Loads the configuration from an optional TOML file plus the process environment
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file; `None` starts from the defaults
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Loads the configuration using a custom environment lookup
///
/// `load_config` is this function with `std::env::var` as the lookup.
pub fn load_config_with_env<F>(path: Option<&Path>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, env);

    validate(&config)?;

    Ok(config)
}

/// Overrides file credentials with values found in the environment
///
/// Empty variables are ignored so an exported-but-blank variable does not wipe a value
/// that came from the file.
pub fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |keys: &[&str]| {
        keys.iter()
            .filter_map(|key| env(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    };

    if let Some(account) = lookup(ACCOUNT_ENV_VARS) {
        config.credentials.account = account;
    }

    if let Some(token) = lookup(TOKEN_ENV_VARS) {
        config.credentials.token = token;
    }
}
