//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business
//! operations, such as talking to the Dataverse Web API or classifying
//! records into pipeline phases.

pub mod dataverse;
pub mod phase_classifier;
pub mod vorhaben_service;
