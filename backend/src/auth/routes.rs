//! Defines the HTTP routes specifically for authentication.
//!
//! These routes drive the device-code login flow from the front-end and are
//! designed to be integrated into the main Axum router.

use crate::auth::handlers::*;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/status", get(auth_status))
        .route("/login", get(login))
        .route("/poll", post(poll))
        .route("/", delete(logout))
}
