// =============================================================================
// GOOGLE ADS OAUTH2 TOKEN SOURCES
// =============================================================================
//
// Steady-state access-token acquisition for the Google Ads API. Two grant
// types are supported:
//
// 1. **Service account (JWT bearer):** sign an RS256 assertion with the
//    service-account private key and exchange it at the token endpoint.
// 2. **Refresh token:** exchange a long-lived refresh token (obtained once
//    through the interactive consent flow, which is not part of this tool)
//    for short-lived access tokens.
//
// Both sources cache the current token in-process and refresh it shortly
// before expiry, so the request path normally pays no extra round trip.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::RwLock;

/// OAuth2 scope for the Google Ads API.
const ADS_SCOPE: &str = "https://www.googleapis.com/auth/adwords";

/// Token endpoint used by the refresh-token grant. Service accounts use the
/// `token_uri` embedded in their key file instead.
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid Google Ads credentials: {0}")]
    Credentials(String),
    #[error("OAuth2 token exchange failed: {0}")]
    Exchange(String),
}

/// Anything that can produce a currently-valid access token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in the JWT).
    client_email: String,
    /// The private key in PEM format.
    private_key: String,
    /// Where to exchange the JWT for an access token.
    token_uri: String,
}

/// JWT claims for the Google OAuth2 JWT bearer grant.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

impl CachedToken {
    fn still_valid(&self) -> bool {
        self.expires_at > SystemTime::now() + EXPIRY_MARGIN
    }
}

/// Token source backed by a Google service account key.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Create an authenticator from a JSON key file path.
    pub async fn from_file(path: &str) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::Credentials(format!("reading {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    /// Create an authenticator from the key-file JSON itself.
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let credentials: ServiceAccountCredentials =
            serde_json::from_str(json).map_err(|e| AuthError::Credentials(e.to_string()))?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cached_token: RwLock::new(None),
        })
    }

    async fn fetch_new_token(&self) -> Result<TokenResponse, AuthError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AuthError::Exchange(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: ADS_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::Credentials(e.to_string()))?;
        let jwt = encode(&header, &claims, &key)
            .map_err(|e| AuthError::Credentials(e.to_string()))?;

        exchange(
            &self.client,
            &self.credentials.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ],
        )
        .await
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.still_valid() {
                    return Ok(token.token.clone());
                }
            }
        }

        let response = self.fetch_new_token().await?;
        let token = response.access_token.clone();

        let mut cached = self.cached_token.write().await;
        *cached = Some(CachedToken {
            token: response.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
        });

        Ok(token)
    }
}

/// Token source backed by an OAuth2 refresh token.
pub struct RefreshTokenAuth {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl RefreshTokenAuth {
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
            client: Client::new(),
            cached_token: RwLock::new(None),
        }
    }
}

#[async_trait]
impl AccessTokenSource for RefreshTokenAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.still_valid() {
                    return Ok(token.token.clone());
                }
            }
        }

        let response = exchange(
            &self.client,
            TOKEN_ENDPOINT,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("refresh_token", &self.refresh_token),
            ],
        )
        .await?;
        let token = response.access_token.clone();

        let mut cached = self.cached_token.write().await;
        *cached = Some(CachedToken {
            token: response.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
        });

        Ok(token)
    }
}

/// POST a form-encoded grant to a token endpoint and parse the response.
async fn exchange(
    client: &Client,
    endpoint: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = client
        .post(endpoint)
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::Exchange(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Exchange(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::Exchange(e.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_key_json() {
        let result = ServiceAccountAuth::from_json("{\"client_email\": 42}");
        assert!(matches!(result, Err(AuthError::Credentials(_))));
    }

    #[test]
    fn cached_token_expiry_margin() {
        let fresh = CachedToken {
            token: "t".to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(3600),
        };
        let stale = CachedToken {
            token: "t".to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(30),
        };

        assert!(fresh.still_valid());
        // Inside the refresh margin counts as expired.
        assert!(!stale.still_valid());
    }
}
