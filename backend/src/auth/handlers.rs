//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for the device-code login
//! flow (status, initiate, poll, logout), validate input, and delegate to
//! `auth::service` for the lifecycle logic.

use crate::api::common::{auth_error_to_http, validation_error_response};
use crate::auth::models::*;
use crate::auth::service::AuthService;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::Json as ResponseJson,
};
use std::sync::Arc;
use validator::Validate;

/// Report whether a valid credential exists, without refreshing it.
#[axum::debug_handler]
pub async fn auth_status(
    Extension(auth): Extension<Arc<AuthService>>,
) -> Result<ResponseJson<AuthStatusResponse>, (StatusCode, String)> {
    match auth.auth_status().await {
        Ok(status) => Ok(ResponseJson(AuthStatusResponse {
            is_authenticated: status.is_authenticated,
            expires_in: status.seconds_until_expiry,
        })),
        Err(error) => Err(auth_error_to_http(error)),
    }
}

/// Start a device-code login attempt.
#[axum::debug_handler]
pub async fn login(
    Extension(auth): Extension<Arc<AuthService>>,
) -> Result<ResponseJson<LoginResponse>, (StatusCode, String)> {
    match auth.initiate().await {
        Ok(request) => Ok(ResponseJson(LoginResponse {
            user_code: request.user_code,
            verification_url: request.verification_url,
            device_code: request.device_code,
            expires_in: request.expires_in,
            interval: request.interval,
            message: request.message,
        })),
        Err(error) => Err(auth_error_to_http(error)),
    }
}

/// Check once whether the pending login attempt has been authorized.
#[axum::debug_handler]
pub async fn poll(
    Extension(auth): Extension<Arc<AuthService>>,
    Json(payload): Json<PollRequest>,
) -> Result<ResponseJson<PollResponse>, (StatusCode, String)> {
    if let Err(validation_errors) = payload.validate() {
        return Err(validation_error_response(validation_errors));
    }

    match auth.poll(&payload.device_code).await {
        Ok(outcome) => Ok(ResponseJson(outcome.into())),
        Err(error) => Err(auth_error_to_http(error)),
    }
}

/// Destroy the stored credential.
#[axum::debug_handler]
pub async fn logout(
    Extension(auth): Extension<Arc<AuthService>>,
) -> Result<ResponseJson<LogoutResponse>, (StatusCode, String)> {
    match auth.logout().await {
        Ok(()) => Ok(ResponseJson(LogoutResponse { success: true })),
        Err(error) => Err(auth_error_to_http(error)),
    }
}
