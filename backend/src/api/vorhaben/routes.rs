//! Defines the HTTP routes for Vorhaben management.
//!
//! All record endpoints require an authenticated Dataverse session; the
//! `require_auth` middleware rejects with 401 otherwise.

use super::handlers::*;
use crate::auth::middleware::require_auth;
use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

pub async fn vorhaben_router() -> Router {
    Router::new()
        .route("/", get(list_vorhaben))
        .route("/", post(create_vorhaben))
        .route("/{id}", get(get_vorhaben))
        .route("/{id}", patch(update_vorhaben))
        .route("/{id}", delete(delete_vorhaben))
        .layer(middleware::from_fn(require_auth))
}
