use serde::Deserialize;

/// Main configuration structure for Issue-Pulse
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Remote issue API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the REST API (no trailing slash needed)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Value of the `Accept` header sent with every request
    pub accept: String,

    /// Value of the `X-GitHub-Api-Version` header
    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Overall per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            accept: "application/vnd.github+json".to_string(),
            api_version: "2022-11-28".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Account credentials used for every outbound call
#[derive(Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    /// Account name, also sent as the user agent
    #[serde(default)]
    pub account: String,

    /// Personal access token
    #[serde(default)]
    pub token: String,
}

// Keep the token out of logs and panic messages.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("account", &self.account)
            .field("token", &"<redacted>")
            .finish()
    }
}
