use std::time::Duration;

use crate::error::GatewayError;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_MAX_POLLS: u32 = 90;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Connection settings for the Genie conversation API plus the polling policy.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub token: String,
    pub space_id: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub request_timeout: Duration,
    pub session_idle_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Required keys are checked
    /// before anything else so a missing credential never reaches the network.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = required(&lookup, "DATABRICKS_HOST")?;
        let token = required(&lookup, "DATABRICKS_TOKEN")?;
        let space_id = required(&lookup, "GENIE_SPACE_ID")?;

        let poll_interval_secs =
            optional_number(&lookup, "GENIE_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let max_polls = optional_number(&lookup, "GENIE_MAX_POLLS", DEFAULT_MAX_POLLS)?;
        let timeout_secs = optional_number(
            &lookup,
            "GENIE_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let idle_secs =
            optional_number(&lookup, "GENIE_SESSION_IDLE_SECS", DEFAULT_SESSION_IDLE_SECS)?;

        if max_polls == 0 {
            return Err(GatewayError::Configuration(
                "GENIE_MAX_POLLS must be at least 1".to_string(),
            ));
        }

        Ok(GatewayConfig {
            host: normalize_host(&host),
            token,
            space_id,
            poll_interval: Duration::from_secs(poll_interval_secs),
            max_polls,
            request_timeout: Duration::from_secs(timeout_secs),
            session_idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    /// Root of every conversation endpoint for the configured space.
    pub fn space_url(&self) -> String {
        format!("{}/api/2.0/genie/spaces/{}", self.host, self.space_id)
    }
}

pub fn server_port() -> Result<u16, GatewayError> {
    server_port_from(|key| std::env::var(key).ok())
}

pub fn server_port_from<F>(lookup: F) -> Result<u16, GatewayError>
where
    F: Fn(&str) -> Option<String>,
{
    optional_number(&lookup, "PORT", DEFAULT_PORT)
}

fn required<F>(lookup: &F, key: &str) -> Result<String, GatewayError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(GatewayError::Configuration(format!("{} is not set", key))),
    }
}

fn optional_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, GatewayError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|_| {
            GatewayError::Configuration(format!("{} must be a number, got {:?}", key, raw))
        }),
        _ => Ok(default),
    }
}

fn normalize_host(host: &str) -> String {
    let trimmed = host.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
