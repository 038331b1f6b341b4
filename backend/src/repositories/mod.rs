//! Persistence layer for locally stored state.
//!
//! The only durable state this backend owns is the single Dataverse
//! credential; everything else lives upstream.

pub mod credential_repository;
