//! Google API credentials.
//!
//! A service account signs an RS256 JWT and exchanges it at the token
//! endpoint for a short-lived bearer token. The token is cached and
//! refreshed shortly before it expires.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use planner_core::{config::SheetsConfig, error::PlannerError, shellexpand};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Read-only access to spreadsheet contents.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before their stated expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a service-account JSON key that token exchange needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, PlannerError> {
        serde_json::from_str(json)
            .map_err(|e| PlannerError::Auth(format!("invalid service account JSON: {e}")))
    }

    /// Decode a base64-wrapped service-account JSON document.
    pub fn from_base64(encoded: &str) -> Result<Self, PlannerError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| PlannerError::Auth(format!("credentials are not valid base64: {e}")))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| PlannerError::Auth(format!("credentials are not UTF-8: {e}")))?;
        Self::from_json(&json)
    }

    pub fn from_file(path: &str) -> Result<Self, PlannerError> {
        let path = shellexpand(path);
        let json = std::fs::read_to_string(&path)
            .map_err(|e| PlannerError::Auth(format!("failed to read {path}: {e}")))?;
        Self::from_json(&json)
    }
}

/// How requests to the Sheets API are authorized.
#[derive(Debug)]
pub enum Credentials {
    /// OAuth bearer tokens minted from a service account.
    ServiceAccount(ServiceAccountAuth),
    /// `?key=` query parameter; only works for publicly readable sheets.
    ApiKey(String),
}

impl Credentials {
    /// Pick credentials from config: inline base64 JSON, then a key file,
    /// then an API key.
    pub fn from_config(cfg: &SheetsConfig) -> Result<Self, PlannerError> {
        if !cfg.credentials.trim().is_empty() {
            let key = ServiceAccountKey::from_base64(&cfg.credentials)?;
            info!("sheets: using service account {}", key.client_email);
            return Ok(Self::ServiceAccount(ServiceAccountAuth::new(key)));
        }
        if !cfg.credentials_file.trim().is_empty() {
            let key = ServiceAccountKey::from_file(&cfg.credentials_file)?;
            info!("sheets: using service account {}", key.client_email);
            return Ok(Self::ServiceAccount(ServiceAccountAuth::new(key)));
        }
        if !cfg.api_key.trim().is_empty() {
            info!("sheets: using API key");
            return Ok(Self::ApiKey(cfg.api_key.trim().to_string()));
        }
        Err(PlannerError::Auth(
            "no Google credentials configured (sheets.credentials, sheets.credentials_file or sheets.api_key)"
                .to_string(),
        ))
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Service-account token source with a cached bearer token.
#[derive(Debug)]
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Serialize)]
pub(crate) struct Claims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            token: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// A valid bearer token, exchanging a fresh assertion when needed.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, PlannerError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(token.access_token.clone());
            }
        }

        debug!("sheets: exchanging service account assertion");
        let assertion = sign_assertion(&self.key, now)?;
        let resp = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PlannerError::Auth(format!("token request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PlannerError::Auth(format!(
                "token endpoint returned {status}: {text}"
            )));
        }

        let parsed: TokenResponse = resp
            .json()
            .await
            .map_err(|e| PlannerError::Auth(format!("failed to parse token response: {e}")))?;

        let token = CachedToken {
            access_token: parsed.access_token,
            expires_at: now + Duration::seconds(parsed.expires_in),
        };
        let access = token.access_token.clone();
        *cached = Some(token);
        Ok(access)
    }
}

pub(crate) fn claims_for(key: &ServiceAccountKey, now: DateTime<Utc>) -> Claims<'_> {
    let iat = now.timestamp();
    Claims {
        iss: &key.client_email,
        scope: SHEETS_READONLY_SCOPE,
        aud: &key.token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    }
}

/// `base64url(header).base64url(claims)`.
pub(crate) fn signing_input(claims: &Claims<'_>) -> Result<String, PlannerError> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{header}.{claims}"))
}

/// Signed RS256 JWT assertion for the token endpoint.
pub(crate) fn sign_assertion(
    key: &ServiceAccountKey,
    now: DateTime<Utc>,
) -> Result<String, PlannerError> {
    let private_key = RsaPrivateKey::from_pkcs8_pem(&key.private_key)
        .map_err(|e| PlannerError::Auth(format!("invalid service account private key: {e}")))?;
    let signing_key = SigningKey::<Sha256>::new(private_key);

    let input = signing_input(&claims_for(key, now))?;
    let signature = signing_key
        .try_sign(input.as_bytes())
        .map_err(|e| PlannerError::Auth(format!("failed to sign assertion: {e}")))?;

    Ok(format!(
        "{input}.{}",
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}
