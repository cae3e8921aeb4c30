//! # Google Authentication
//!
//! Access tokens for the Sheets and Drive APIs.
//!
//! Two sources are supported:
//! - `POPSHEET_ACCESS_TOKEN`: a ready-made bearer token, used as is
//! - a service-account key file (the `client_secret.json` downloaded from
//!   the Cloud console), exchanged for a token with a signed RS256 JWT
//!
//! Service-account tokens are cached and refreshed one minute before they
//! expire.

use crate::ClientError;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// OAuth scopes requested for the service account.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Grant type for the JWT bearer flow.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion.
const ASSERTION_TTL_SECS: u64 = 3600;

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// =============================================================================
// SERVICE ACCOUNT KEY
// =============================================================================

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// The parts of a service-account key file popsheet needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        serde_json::from_str(json)
            .map_err(|e| ClientError::Auth(format!("Invalid service account key: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Auth(format!("Cannot read {}: {e}", path.display())))?;
        Self::from_json(&contents)
    }
}

/// JWT claims of the token request assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    ASSERTION_TTL_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

// =============================================================================
// SERVICE ACCOUNT FLOW
// =============================================================================

/// Exchanges signed assertions for access tokens and caches the result.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self, ClientError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| ClientError::Auth(format!("Invalid private key: {e}")))?;
        Ok(Self {
            key,
            encoding_key,
            http,
            cached: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Sign the assertion sent to the token endpoint.
    pub fn sign_assertion(&self, now_secs: u64) -> Result<String, ClientError> {
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: SCOPES.join(" "),
            aud: self.key.token_uri.clone(),
            iat: now_secs,
            exp: now_secs.saturating_add(ASSERTION_TTL_SECS),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|e| ClientError::Auth(format!("Cannot sign assertion: {e}")))
    }

    async fn fetch(&self) -> Result<CachedToken, ClientError> {
        let now_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let assertion = self.sign_assertion(now_secs)?;

        tracing::debug!("POST {} (service account {})", self.key.token_uri, self.key.client_email);
        let resp = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.key.token_uri)))?;
        let resp = ClientError::check(resp).await?;
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }

    /// Current access token, fetching a new one when the cache is stale.
    pub async fn token(&self) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(ref token) = *cached {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }
        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }
}

// =============================================================================
// TOKEN SOURCE
// =============================================================================

/// Where bearer tokens come from.
#[derive(Clone)]
pub enum TokenSource {
    Static(String),
    ServiceAccount(Arc<ServiceAccountAuth>),
}

impl TokenSource {
    /// Build a service-account source from a key file.
    pub fn from_key_file(path: &Path, http: reqwest::Client) -> Result<Self, ClientError> {
        let key = ServiceAccountKey::load(path)?;
        Ok(Self::ServiceAccount(Arc::new(ServiceAccountAuth::new(
            key, http,
        )?)))
    }

    pub async fn token(&self) -> Result<String, ClientError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount(auth) => auth.token().await,
        }
    }

    /// Short description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Static(_) => "static access token".to_string(),
            Self::ServiceAccount(auth) => format!("service account {}", auth.client_email()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/test_key.pub.pem");

    fn key_json() -> String {
        serde_json::json!({
            "type": "service_account",
            "client_email": "writer@demo.iam.gserviceaccount.com",
            "private_key": PRIVATE_KEY,
            "private_key_id": "k1",
        })
        .to_string()
    }

    #[test]
    fn key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(&key_json()).expect("parse");
        assert_eq!(key.token_uri, GOOGLE_TOKEN_URI);
        assert_eq!(key.private_key_id.as_deref(), Some("k1"));
    }

    #[test]
    fn key_rejects_garbage() {
        assert!(matches!(
            ServiceAccountKey::from_json("{}"),
            Err(ClientError::Auth(_))
        ));
    }

    #[test]
    fn bad_private_key_is_auth_error() {
        let key = ServiceAccountKey {
            client_email: "a@b".into(),
            private_key: "not a pem".into(),
            private_key_id: None,
            token_uri: GOOGLE_TOKEN_URI.into(),
        };
        assert!(ServiceAccountAuth::new(key, reqwest::Client::new()).is_err());
    }

    #[test]
    fn assertion_verifies_with_public_key() {
        let key = ServiceAccountKey::from_json(&key_json()).expect("parse");
        let auth = ServiceAccountAuth::new(key, reqwest::Client::new()).expect("auth");

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_secs();
        let jwt = auth.sign_assertion(now).expect("sign");

        let header = jsonwebtoken::decode_header(&jwt).expect("header");
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("k1"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[GOOGLE_TOKEN_URI]);
        let decoded = jsonwebtoken::decode::<AssertionClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).expect("public key"),
            &validation,
        )
        .expect("verify");

        assert_eq!(decoded.claims.iss, "writer@demo.iam.gserviceaccount.com");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, ASSERTION_TTL_SECS);
        assert!(decoded.claims.scope.contains("auth/spreadsheets"));
        assert!(decoded.claims.scope.contains("auth/drive"));
    }

    #[tokio::test]
    async fn static_source_returns_token() {
        let source = TokenSource::Static("abc".into());
        assert_eq!(source.token().await.expect("token"), "abc");
        assert_eq!(source.describe(), "static access token");
    }
}
