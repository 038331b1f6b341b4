//! Middleware for protecting routes that require a Dataverse session.
//!
//! Record endpoints are only usable once the device-code flow has produced
//! a valid credential; without one they reject with 401 so the front-end
//! can switch to the login prompt.

use crate::auth::service::AuthService;
use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Rejects the request when no valid credential is stored.
///
/// A pure read on the credential store; the transparent refresh happens
/// later, when the handler actually requests a token.
pub async fn require_auth(
    Extension(auth): Extension<Arc<AuthService>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let authenticated = auth
        .is_authenticated()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !authenticated {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
