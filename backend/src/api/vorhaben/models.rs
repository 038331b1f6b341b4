//! Request and response payloads for the Vorhaben API endpoints.

use crate::services::phase_classifier::Phase;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Query parameters of the list endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct VorhabenFilter {
    /// Page number (1-indexed)
    #[validate(range(min = 1))]
    pub page: Option<u32>,

    /// Number of items per page
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,

    /// Restrict to a single pipeline phase, by name or numeric key.
    #[serde(default, deserialize_with = "deserialize_phase")]
    pub phase: Option<Phase>,

    /// Restrict to a Typ OptionSet code.
    pub typ: Option<i64>,
}

fn deserialize_phase<'de, D>(deserializer: D) -> Result<Option<Phase>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let opt_string: Option<String> = Option::deserialize(deserializer)?;
    match opt_string {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Phase::from_str(s.trim()).map(Some).map_err(Error::custom),
        None => Ok(None),
    }
}

/// A Vorhaben record as rendered in list and detail views, annotated with
/// its classified pipeline phase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VorhabenSummary {
    pub id: String,
    pub name: Option<String>,
    pub typ: Option<i64>,
    pub lifecycle_status: Option<i64>,
    pub kritikalitaet: Option<i64>,
    pub komplexitaet: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planungsstart: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planungsende: Option<NaiveDate>,
    /// Numeric phase key, 1 through 4.
    pub phase: u8,
    pub phase_label: String,
}

/// Body of the create endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVorhabenRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    pub typ: Option<i64>,
    pub lifecycle_status: Option<i64>,
    pub kritikalitaet: Option<i64>,
    pub komplexitaet: Option<i64>,
    pub planungsstart: Option<NaiveDate>,
    pub planungsende: Option<NaiveDate>,
}

/// Body of the update endpoint. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVorhabenRequest {
    #[validate(length(min = 1, max = 200, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub typ: Option<i64>,
    pub lifecycle_status: Option<i64>,
    pub kritikalitaet: Option<i64>,
    pub komplexitaet: Option<i64>,
    pub planungsstart: Option<NaiveDate>,
    pub planungsende: Option<NaiveDate>,
}
