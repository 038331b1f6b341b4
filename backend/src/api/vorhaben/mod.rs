//! Vorhaben API: list, detail, create and update endpoints.

pub mod handlers;
pub mod models;
pub mod routes;
