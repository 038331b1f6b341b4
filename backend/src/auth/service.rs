//! Core business logic for the authentication system.
//!
//! `AuthService` owns the OAuth 2.0 device-authorization-grant lifecycle
//! against Azure AD and is the only place downstream callers obtain a
//! bearer token from. Polling is caller-driven: the service performs one
//! network round trip per call and never retries internally. The single
//! automatic recovery is the transparent refresh inside `get_valid_token`
//! when the stored credential is close to expiry.

use crate::auth::models::{
    AuthStatus, Credential, DeviceAuthorizationRequest, DeviceCodeResponse, PollOutcome,
    TokenErrorResponse, TokenResponse,
};
use crate::config::Config;
use crate::errors::AuthError;
use crate::repositories::credential_repository::CredentialStore;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Access tokens are refreshed this close to expiry, so a token handed out
/// by `get_valid_token` does not lapse mid-request.
const REFRESH_BUFFER_SECS: i64 = 5 * 60;

/// Identity provider endpoints and client parameters.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub device_code_url: String,
    pub token_url: String,
    pub client_id: String,
    /// Resource/audience tokens are requested for; the Dataverse URL.
    pub resource: String,
}

impl From<&Config> for AuthConfig {
    fn from(config: &Config) -> Self {
        AuthConfig {
            device_code_url: config.device_code_url(),
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            resource: config.dataverse_url.clone(),
        }
    }
}

/// Token lifecycle manager for the single-tenant Dataverse credential.
pub struct AuthService {
    config: AuthConfig,
    http: reqwest::Client,
    store: Arc<dyn CredentialStore>,
}

impl AuthService {
    pub fn new(config: AuthConfig, store: Arc<dyn CredentialStore>) -> Self {
        AuthService {
            config,
            http: reqwest::Client::new(),
            store,
        }
    }

    /// Starts a device-code login attempt.
    ///
    /// Pure network call; nothing is persisted until a later poll succeeds.
    pub async fn initiate(&self) -> Result<DeviceAuthorizationRequest, AuthError> {
        if self.config.resource.trim().is_empty() {
            return Err(AuthError::Configuration(
                "Dataverse resource URL is not configured".to_string(),
            ));
        }

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("resource", self.config.resource.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.device_code_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(format!("Device code request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Upstream(format!(
                "Device code endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: DeviceCodeResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Upstream(format!("Malformed device code response: {}", e)))?;

        info!(user_code = %parsed.user_code, "Device code flow initiated");

        Ok(DeviceAuthorizationRequest {
            device_code: parsed.device_code,
            user_code: parsed.user_code,
            verification_url: parsed.verification_url,
            expires_in: parsed.expires_in,
            interval: parsed.interval,
            message: parsed.message,
        })
    }

    /// One-shot check whether the user has completed the device flow.
    ///
    /// Safe to call repeatedly with the same device code; the caller owns
    /// the retry cadence and must stop once the issuance window elapses.
    /// On success the freshly issued credential is persisted before
    /// returning.
    pub async fn poll(&self, device_code: &str) -> Result<PollOutcome, AuthError> {
        let params = [
            ("grant_type", "device_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", device_code),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let token: TokenResponse = response.json().await.map_err(|e| {
                AuthError::Upstream(format!("Malformed token response: {}", e))
            })?;
            let credential = self.credential_from(token);
            self.store.save(&credential).await?;
            info!("Device code flow completed, credential stored");
            return Ok(PollOutcome::Success);
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Upstream(format!("Token request failed: {}", e)))?;

        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(provider_error) => match provider_error.error.as_str() {
                "authorization_pending" => Ok(PollOutcome::Pending),
                "expired_token" | "code_expired" => Ok(PollOutcome::Expired),
                _ => Ok(PollOutcome::Failed(provider_error.message())),
            },
            Err(_) => Err(AuthError::Upstream(format!(
                "Token endpoint returned {}: {}",
                status, body
            ))),
        }
    }

    /// True iff a stored credential exists and has not expired.
    ///
    /// Pure read; never refreshes, never touches the network.
    pub async fn is_authenticated(&self) -> Result<bool, AuthError> {
        let credential = self.store.load().await?;
        Ok(credential.map(|c| c.is_valid(Utc::now())).unwrap_or(false))
    }

    /// Returns a currently usable access token.
    ///
    /// Refreshes synchronously when the stored credential expires within
    /// the refresh buffer. A failed refresh clears the credential, forcing
    /// a full re-login.
    pub async fn get_valid_token(&self) -> Result<String, AuthError> {
        let credential = self
            .store
            .load()
            .await?
            .ok_or(AuthError::NotAuthenticated)?;

        if !credential.expires_within(Utc::now(), Duration::seconds(REFRESH_BUFFER_SECS)) {
            return Ok(credential.access_token);
        }

        self.refresh(credential).await
    }

    /// Read-only status for UI display. Must not trigger a refresh, so a
    /// passive status poll never causes a surprise network call.
    pub async fn auth_status(&self) -> Result<AuthStatus, AuthError> {
        let now = Utc::now();
        let status = match self.store.load().await? {
            Some(credential) if credential.is_valid(now) => AuthStatus {
                is_authenticated: true,
                seconds_until_expiry: Some((credential.expires_at - now).num_seconds()),
            },
            _ => AuthStatus {
                is_authenticated: false,
                seconds_until_expiry: None,
            },
        };
        Ok(status)
    }

    /// Destroys the stored credential. Idempotent.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.store.delete().await?;
        info!("Credential deleted, user logged out");
        Ok(())
    }

    async fn refresh(&self, credential: Credential) -> Result<String, AuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", credential.refresh_token.as_str()),
            ("resource", self.config.resource.as_str()),
        ];

        let failure = match self.http.post(&self.config.token_url).form(&params).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<TokenResponse>().await {
                    Ok(token) => {
                        let renewed = self.credential_from(token);
                        self.store.save(&renewed).await?;
                        info!("Access token refreshed");
                        return Ok(renewed.access_token);
                    }
                    Err(e) => format!("Malformed token response: {}", e),
                }
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                match serde_json::from_str::<TokenErrorResponse>(&body) {
                    Ok(provider_error) => provider_error.message(),
                    Err(_) => format!("Token endpoint returned {}: {}", status, body),
                }
            }
            Err(e) => format!("Token request failed: {}", e),
        };

        // Irrecoverable: drop the credential so the next call prompts a
        // fresh login instead of retrying a dead refresh token.
        warn!(error = %failure, "Token refresh failed, clearing credential");
        self.store.delete().await?;
        Err(AuthError::RefreshFailed(failure))
    }

    fn credential_from(&self, token: TokenResponse) -> Credential {
        Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in as i64),
            resource: token
                .resource
                .unwrap_or_else(|| self.config.resource.clone()),
        }
    }
}
