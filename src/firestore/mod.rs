//! Native Firestore REST client.
//!
//! Talks to the store directly over HTTP via reqwest, no vendor SDK.
//! Token format is compatible with the token.json that Google's Python
//! OAuth library writes, so the same credential can drive the desktop
//! planner and this dashboard.
//!
//! Modules:
//! - documents: list + structured query over the planner collections

pub mod documents;

pub use documents::{FieldValue, RawDocument};

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FirestoreError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token expired or revoked")]
    AuthExpired,
    #[error("Token not found at {0}")]
    TokenNotFound(PathBuf),
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Token types — compatible with Python's google-auth token format
// ============================================================================

/// OAuth2 token payload persisted at the token path.
///
/// Field names match what `google.oauth2.credentials.Credentials.to_json()`
/// produces. Both `token` and `access_token` are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreToken {
    #[serde(alias = "access_token")]
    pub token: String,
    /// Long-lived refresh token used to mint new access tokens.
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access-token expiry (ISO 8601).
    #[serde(default)]
    pub expiry: Option<String>,
    /// Authenticated user email (Python stores it in "account").
    #[serde(default, alias = "email")]
    pub account: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Token file path: $HEARTHBOARD_TOKEN_PATH, else ~/.hearthboard/google/token.json.
pub fn token_path() -> PathBuf {
    if let Some(path) = std::env::var_os("HEARTHBOARD_TOKEN_PATH") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_default()
        .join(".hearthboard")
        .join("google")
        .join("token.json")
}

pub fn load_token() -> Result<StoreToken, FirestoreError> {
    let path = token_path();
    if !path.exists() {
        return Err(FirestoreError::TokenNotFound(path));
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_token(token: &StoreToken) -> Result<(), FirestoreError> {
    let path = token_path();
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&path, serde_json::to_string_pretty(token)?)?;
    Ok(())
}

/// Check whether a token needs refreshing, with a 60-second skew margin.
pub fn is_token_expired(token: &StoreToken) -> bool {
    let Some(expiry_str) = &token.expiry else {
        // No expiry recorded: assume stale and let the refresh sort it out.
        return true;
    };
    // Python writes "2026-02-08T12:00:00.000000Z" and variants.
    match chrono::DateTime::parse_from_rfc3339(&expiry_str.replace('Z', "+00:00"))
        .or_else(|_| chrono::DateTime::parse_from_rfc3339(expiry_str))
    {
        Ok(expiry) => expiry <= chrono::Utc::now() + chrono::Duration::seconds(60),
        Err(_) => true,
    }
}

// ============================================================================
// Retry
// ============================================================================

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

fn status_is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_delay(
    attempt: u32,
    policy: &RetryPolicy,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> Duration {
    // A server-provided Retry-After wins, capped at 30s.
    if let Some(secs) = retry_after
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        return Duration::from_secs(secs.min(30));
    }
    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let millis = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    Duration::from_millis(millis)
}

/// Send a request, retrying 429/408/5xx and transport errors with backoff.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, FirestoreError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let Some(cloned) = request.try_clone() else {
            return request.send().await.map_err(FirestoreError::Http);
        };

        match cloned.send().await {
            Ok(response) => {
                let status = response.status();
                if status_is_retryable(status) && attempt < attempts {
                    let delay = retry_delay(
                        attempt,
                        policy,
                        response.headers().get(reqwest::header::RETRY_AFTER),
                    );
                    log::warn!(
                        "firestore retry {}/{} after status {} (sleep {:?})",
                        attempt,
                        attempts,
                        status,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Ok(response);
            }
            Err(err) => {
                if (err.is_timeout() || err.is_connect()) && attempt < attempts {
                    let delay = retry_delay(attempt, policy, None);
                    log::warn!(
                        "firestore retry {}/{} after transport error: {} (sleep {:?})",
                        attempt,
                        attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(FirestoreError::Http(err));
            }
        }
    }
    Err(FirestoreError::RefreshFailed(
        "request exhausted retries".to_string(),
    ))
}

// ============================================================================
// Client handle
// ============================================================================

/// Long-lived store handle: one HTTP connection pool for the process.
pub struct Firestore {
    http: reqwest::Client,
}

static STORE: OnceLock<Firestore> = OnceLock::new();

/// Serializes concurrent token refreshes.
static TOKEN_REFRESH_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

fn refresh_mutex() -> &'static Mutex<()> {
    TOKEN_REFRESH_MUTEX.get_or_init(|| Mutex::new(()))
}

impl Firestore {
    /// Get the process-wide store handle, initializing it on first use.
    /// Calling again is a no-op returning the same handle.
    pub fn global() -> &'static Firestore {
        STORE.get_or_init(|| Firestore {
            http: reqwest::Client::new(),
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Get a valid access token, refreshing through the token endpoint if
    /// the stored one is expired. Entry point for every API call.
    pub async fn access_token(&self) -> Result<String, FirestoreError> {
        let token = load_token()?;
        if !is_token_expired(&token) {
            return Ok(token.token);
        }
        let refreshed = self.refresh_access_token(&token).await?;
        Ok(refreshed.token)
    }

    async fn refresh_access_token(
        &self,
        token: &StoreToken,
    ) -> Result<StoreToken, FirestoreError> {
        let _guard = refresh_mutex().lock().await;

        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or(FirestoreError::AuthExpired)?;

        let mut form = vec![
            ("client_id", token.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = token.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let resp = self.http.post(&token.token_uri).form(&form).send().await?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_refresh_error(status.as_u16(), &body_text));
        }
        let body: serde_json::Value = serde_json::from_str(&body_text)?;

        let access_token = body["access_token"]
            .as_str()
            .ok_or_else(|| FirestoreError::RefreshFailed("No access_token in response".into()))?;
        let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
        let expiry = chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64);

        let mut new_token = token.clone();
        new_token.token = access_token.to_string();
        new_token.expiry = Some(expiry.to_rfc3339());
        save_token(&new_token)?;

        Ok(new_token)
    }
}

fn map_refresh_error(status: u16, body: &str) -> FirestoreError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return FirestoreError::AuthExpired;
    }
    FirestoreError::RefreshFailed(format!("HTTP {}: {}", status, body))
}

// ============================================================================
// Tests
// ============================================================================
