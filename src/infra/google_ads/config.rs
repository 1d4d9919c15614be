use std::time::Duration;

use thiserror::Error;

/// Default deadline applied to every Google Ads API call.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {message}")]
    Invalid {
        name: &'static str,
        message: String,
    },
}

/// Which credential the token source should be built from.
#[derive(Debug, Clone)]
pub enum CredentialConfig {
    /// Path to a service-account JSON key file.
    ServiceAccountKeyFile(String),
    /// The service-account key JSON itself (for deployments without a
    /// mounted file).
    ServiceAccountJson(String),
    /// OAuth2 refresh-token triple from the one-time consent flow.
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

/// Everything needed to talk to the Google Ads API for one account.
#[derive(Debug, Clone)]
pub struct AdsConfig {
    pub developer_token: String,
    pub customer_id: u64,
    /// Manager-account id used for authentication, when the customer is
    /// accessed through a manager.
    pub login_customer_id: Option<u64>,
    pub credentials: CredentialConfig,
    pub request_timeout: Duration,
}

impl AdsConfig {
    /// Build the configuration from `GOOGLE_ADS_*` environment variables.
    ///
    /// Credential resolution order: service-account key file, inline
    /// service-account JSON, then the refresh-token triple.
    pub fn from_env() -> Result<Self, ConfigError> {
        let developer_token = require("GOOGLE_ADS_DEVELOPER_TOKEN")?;
        let customer_id_raw = require("GOOGLE_ADS_CUSTOMER_ID")?;
        let customer_id = parse_customer_id("GOOGLE_ADS_CUSTOMER_ID", &customer_id_raw)?;

        let login_customer_id = match std::env::var("GOOGLE_ADS_LOGIN_CUSTOMER_ID") {
            Ok(raw) if !raw.is_empty() => {
                Some(parse_customer_id("GOOGLE_ADS_LOGIN_CUSTOMER_ID", &raw)?)
            }
            _ => None,
        };

        let credentials = if let Ok(path) = std::env::var("GOOGLE_ADS_SERVICE_ACCOUNT_KEY") {
            CredentialConfig::ServiceAccountKeyFile(path)
        } else if let Ok(json) = std::env::var("GOOGLE_ADS_SERVICE_ACCOUNT_JSON") {
            CredentialConfig::ServiceAccountJson(json)
        } else {
            CredentialConfig::RefreshToken {
                client_id: require("GOOGLE_ADS_CLIENT_ID")?,
                client_secret: require("GOOGLE_ADS_CLIENT_SECRET")?,
                refresh_token: require("GOOGLE_ADS_REFRESH_TOKEN")?,
            }
        };

        let request_timeout = match std::env::var("GOOGLE_ADS_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| ConfigError::Invalid {
                name: "GOOGLE_ADS_REQUEST_TIMEOUT_SECS",
                message: format!("'{}' is not a number of seconds", raw),
            })?),
            Err(_) => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            developer_token,
            customer_id,
            login_customer_id,
            credentials,
            request_timeout,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Customer ids are usually written `123-456-7890`; accept that form as
/// well as the bare digits the API actually wants.
fn parse_customer_id(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let digits: String = raw.chars().filter(|c| *c != '-').collect();
    digits.parse().map_err(|_| ConfigError::Invalid {
        name,
        message: format!("'{}' is not a customer id", raw),
    })
}

// ============================================================================
// TESTS
// ============================================================================
