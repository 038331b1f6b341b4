//! Main entry point for the Leitungsteam Platform backend.
//!
//! This file initializes the Axum web server, wires up the credential
//! store, the auth service and the Dataverse client, and registers all API
//! routes and middleware. It orchestrates the application's startup and
//! defines its overall structure.

mod api;
mod auth;
mod config;
mod errors;
mod repositories;
mod services;

use crate::api::common::ApiResponse;
use auth::service::{AuthConfig, AuthService};
use axum::{Extension, Router, response::Json, routing::get};
use config::Config;
use repositories::credential_repository::FileCredentialStore;
use services::dataverse::DataverseClient;
use services::vorhaben_service::VorhabenService;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();

    let store = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
    let auth_service = Arc::new(AuthService::new(AuthConfig::from(&config), store));
    let dataverse = Arc::new(DataverseClient::new(
        config.dataverse_url.clone(),
        auth_service.clone(),
    ));
    let vorhaben_service = Arc::new(VorhabenService::new(
        dataverse,
        config.phase_ranges.clone(),
    ));

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .nest("/api/vorhaben", api::vorhaben::routes::vorhaben_router().await)
        .layer(Extension(auth_service))
        .layer(Extension(vorhaben_service));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!(
        "Starting Leitungsteam Platform server on port {}",
        config.server_port
    );
    axum::serve(listener, app).await.unwrap();
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Leitungsteam Platform Backend",
            "version": "0.1.0"
        }),
        "Welcome to the Leitungsteam Platform API",
    ))
}
