//! Authentication module for the Dataverse device-code login.
//!
//! This module owns the OAuth device-code lifecycle: initiating a login,
//! polling for completion, refreshing and persisting the credential, and
//! the HTTP endpoints the front-end drives the flow with.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
