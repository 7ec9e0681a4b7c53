use crate::config::types::{ApiConfig, Config, CredentialsConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_credentials(&config.credentials)?;
    Ok(())
}

/// Validates the remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must include a host, got '{}'",
            config.base_url
        )));
    }

    if config.accept.trim().is_empty() {
        return Err(ConfigError::Validation("accept cannot be empty".to_string()));
    }

    if config.api_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api-version cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates that both credentials are present
fn validate_credentials(config: &CredentialsConfig) -> Result<(), ConfigError> {
    if config.account.trim().is_empty() {
        return Err(ConfigError::MissingCredential("account"));
    }

    if config.token.trim().is_empty() {
        return Err(ConfigError::MissingCredential("token"));
    }

    Ok(())
}
