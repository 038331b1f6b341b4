//! Data structures for authentication-related entities.
//!
//! This module defines the persisted credential, the transient device-code
//! login attempt, the identity provider wire formats, and the request and
//! response payloads of the auth API endpoints.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// The locally persisted access/refresh token pair plus expiry metadata.
///
/// Exactly one credential exists at a time; it is replaced wholesale on
/// every refresh and deleted on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute instant at which `access_token` becomes invalid.
    pub expires_at: DateTime<Utc>,
    /// Base URL/audience the token was issued for.
    pub resource: String,
}

impl Credential {
    /// A credential is valid iff the access token is non-empty and the
    /// expiry is strictly in the future.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && self.expires_at > now
    }

    /// True when the credential expires within `buffer` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        self.expires_at - now <= buffer
    }
}

/// A pending device-code login attempt.
///
/// Never persisted; the front-end holds it for the duration of the login
/// and feeds `device_code` back into the poll endpoint.
#[derive(Debug, Clone)]
pub struct DeviceAuthorizationRequest {
    /// Correlation token for polling, never shown to the user.
    pub device_code: String,
    /// Short code the user enters on the verification page.
    pub user_code: String,
    pub verification_url: String,
    /// Validity window in seconds from issuance.
    pub expires_in: u64,
    /// Minimum seconds between polls.
    pub interval: u64,
    pub message: Option<String>,
}

/// Outcome of a single poll round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// User has not completed the flow yet; retry after `interval`.
    Pending,
    /// Credential issued and persisted.
    Success,
    /// The device code's validity window elapsed; restart at initiate.
    Expired,
    /// Provider-reported failure, message surfaced verbatim.
    Failed(String),
}

/// Read-only authentication status for UI display.
#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub is_authenticated: bool,
    pub seconds_until_expiry: Option<i64>,
}

// --- Identity provider wire formats ---------------------------------------

/// Azure AD returns numeric fields as JSON strings on the v1 endpoints and
/// as numbers elsewhere; accept both.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .parse::<u64>()
            .map_err(|e| Error::custom(format!("Invalid seconds value '{}': {}", s, e))),
    }
}

/// Device-code endpoint response.
#[derive(Debug, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    /// The provider uses either field name depending on endpoint version.
    #[serde(alias = "verification_uri")]
    pub verification_url: String,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub expires_in: u64,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub interval: u64,
    pub message: Option<String>,
}

/// Token endpoint success response, for both the device-code and the
/// refresh-token grants.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub expires_in: u64,
    pub resource: Option<String>,
}

/// Token endpoint error response.
#[derive(Debug, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

impl TokenErrorResponse {
    pub fn message(&self) -> String {
        self.error_description
            .clone()
            .unwrap_or_else(|| self.error.clone())
    }
}

// --- Auth API payloads -----------------------------------------------------

/// Response of `GET /auth/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

/// Response of `GET /auth/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_code: String,
    pub verification_url: String,
    pub device_code: String,
    pub expires_in: u64,
    pub interval: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body of `POST /auth/poll`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    #[validate(length(min = 1, message = "Device code is required"))]
    pub device_code: String,
}

/// Response of `POST /auth/poll`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub success: bool,
    /// One of `pending`, `success`, `expired`, `error`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PollOutcome> for PollResponse {
    fn from(outcome: PollOutcome) -> Self {
        match outcome {
            PollOutcome::Pending => PollResponse {
                success: false,
                status: "pending",
                error: None,
            },
            PollOutcome::Success => PollResponse {
                success: true,
                status: "success",
                error: None,
            },
            PollOutcome::Expired => PollResponse {
                success: false,
                status: "expired",
                error: None,
            },
            PollOutcome::Failed(message) => PollResponse {
                success: false,
                status: "error",
                error: Some(message),
            },
        }
    }
}

/// Response of `DELETE /auth`.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}
