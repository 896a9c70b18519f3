//! Process configuration, loaded once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Medibook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "medibook=info".to_string()
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("MEDIBOOK_BIND is not a valid socket address: {0}")]
    InvalidBindAddr(String),

    #[error("{0} is not a valid number: {1}")]
    InvalidNumber(&'static str, String),
}

/// Everything the service needs to run. Secrets are mandatory; the rest
/// has development defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    /// Payment processor HTTP endpoint.
    pub gateway_base_url: String,
    /// Publishable processor key, echoed to clients so they can open the
    /// processor's payment UI.
    pub processor_account_key: String,
    /// Server-only processor API secret (basic-auth password).
    pub processor_api_secret: String,
    /// Shared secret for the confirmation signature HMAC.
    pub signature_secret: String,
    pub currency: String,
    /// Optional JSON price file overriding the built-in table.
    pub price_file: Option<PathBuf>,
    /// Minutes before an unconfirmed pending appointment is swept. 0 disables.
    pub pending_ttl_mins: u64,
    /// Pre-provisioned bearer sessions, `token:caller_id` pairs.
    pub session_tokens: Vec<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_raw = env_or("MEDIBOOK_BIND", "127.0.0.1:8080");
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_raw))?;

        let ttl_raw = env_or("MEDIBOOK_PENDING_TTL_MINS", "30");
        let pending_ttl_mins = ttl_raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber("MEDIBOOK_PENDING_TTL_MINS", ttl_raw))?;

        Ok(Self {
            bind_addr,
            db_path: PathBuf::from(env_or("MEDIBOOK_DB", "medibook.db")),
            gateway_base_url: env_or("MEDIBOOK_GATEWAY_URL", "https://api.razorpay.com"),
            processor_account_key: required("MEDIBOOK_PROCESSOR_KEY")?,
            processor_api_secret: required("MEDIBOOK_PROCESSOR_SECRET")?,
            signature_secret: required("MEDIBOOK_SIGNATURE_SECRET")?,
            currency: env_or("MEDIBOOK_CURRENCY", "INR"),
            price_file: std::env::var("MEDIBOOK_PRICES").ok().map(PathBuf::from),
            pending_ttl_mins,
            session_tokens: parse_session_tokens(&env_or("MEDIBOOK_SESSION_TOKENS", "")),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

/// Parse `token:caller_id[,token:caller_id...]`. Malformed entries are
/// skipped with a warning rather than failing startup.
fn parse_session_tokens(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            match entry.trim().split_once(':') {
                Some((token, caller)) if !token.is_empty() && !caller.is_empty() => {
                    Some((token.to_string(), caller.to_string()))
                }
                _ => {
                    tracing::warn!(entry, "Skipping malformed session token entry");
                    None
                }
            }
        })
        .collect()
}
