//! Google service-account authentication.
//!
//! Signs an RS256 JWT assertion with the service account's private key and
//! exchanges it for an OAuth access token. Tokens are cached until shortly
//! before they expire.

use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use applymate_types::error::StoreError;

pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are refreshed.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of the assertion for `email`, issued at `now` (unix seconds).
pub fn assertion_claims(email: &str, now: i64) -> Claims {
    Claims {
        iss: email.to_string(),
        scope: SHEETS_SCOPE.to_string(),
        aud: TOKEN_URI.to_string(),
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS as u64
}

struct CachedToken {
    token: SecretString,
    expires_at: Instant,
}

/// Access-token source for one service account.
pub struct ServiceAccountAuth {
    client: reqwest::Client,
    email: String,
    key: EncodingKey,
    token_uri: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// # Errors
    ///
    /// [`StoreError::Authentication`] when the private key is not a valid
    /// RSA PEM.
    pub fn new(
        client: reqwest::Client,
        email: String,
        private_key: &SecretString,
    ) -> Result<Self, StoreError> {
        let key = EncodingKey::from_rsa_pem(private_key.expose_secret().as_bytes())
            .map_err(|e| StoreError::Authentication(format!("invalid private key: {e}")))?;

        Ok(Self {
            client,
            email,
            key,
            token_uri: TOKEN_URI.to_string(),
            cached: Mutex::new(None),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// A valid access token, fetching a new one when the cache is stale.
    pub async fn access_token(&self) -> Result<SecretString, StoreError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + REFRESH_MARGIN {
                return Ok(SecretString::from(token.token.expose_secret().to_string()));
            }
        }

        let fresh = self.fetch_token().await?;
        let token = SecretString::from(fresh.token.expose_secret().to_string());
        *cached = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token (after the API rejected it).
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch_token(&self) -> Result<CachedToken, StoreError> {
        let claims = assertion_claims(&self.email, chrono::Utc::now().timestamp());
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| StoreError::Authentication(format!("failed to sign assertion: {e}")))?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Connection(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Authentication(format!("HTTP {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("token response: {e}")))?;

        tracing::debug!(
            account = %self.email,
            expires_in = token.expires_in,
            "Fetched Sheets access token"
        );

        Ok(CachedToken {
            token: SecretString::from(token.access_token),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_cover_one_hour() {
        let claims = assertion_claims("bot@project.iam.gserviceaccount.com", 1_700_000_000);
        assert_eq!(claims.iss, "bot@project.iam.gserviceaccount.com");
        assert_eq!(claims.scope, SHEETS_SCOPE);
        assert_eq!(claims.aud, TOKEN_URI);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn invalid_pem_is_an_authentication_error() {
        let result = ServiceAccountAuth::new(
            reqwest::Client::new(),
            "bot@example.com".into(),
            &SecretString::from("not a key"),
        );
        assert!(matches!(result, Err(StoreError::Authentication(_))));
    }

    #[test]
    fn token_response_defaults_expiry() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"ya29.x","token_type":"Bearer"}"#).unwrap();
        assert_eq!(token.access_token, "ya29.x");
        assert_eq!(token.expires_in, 3600);
    }
}
