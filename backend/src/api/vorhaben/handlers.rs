//! Handler functions for the Vorhaben API endpoints.
//!
//! These functions process requests for Vorhaben records, validate input,
//! and delegate to the `VorhabenService` which talks to Dataverse and
//! annotates records with their pipeline phase.

use crate::api::common::{
    ApiResponse, PaginationFilter, PaginationMeta, apply_pagination, service_error_to_http,
    validation_error_response,
};
use crate::api::vorhaben::models::*;
use crate::services::vorhaben_service::VorhabenService;
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use std::sync::Arc;
use validator::Validate;

#[axum::debug_handler]
pub async fn list_vorhaben(
    Extension(vorhaben): Extension<Arc<VorhabenService>>,
    Query(filter): Query<VorhabenFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<VorhabenSummary>>>, (StatusCode, String)> {
    if let Err(validation_errors) = filter.validate() {
        return Err(validation_error_response(validation_errors));
    }

    match vorhaben.list(filter.typ, filter.phase).await {
        Ok(items) => {
            let pagination = PaginationFilter {
                page: filter.page,
                per_page: filter.per_page,
            };
            let meta =
                PaginationMeta::new(pagination.page(), pagination.per_page(), items.len() as u64);
            let page = apply_pagination(items, &pagination);
            Ok(ResponseJson(ApiResponse::paginated(
                page,
                meta,
                "Vorhaben fetched successfully",
            )))
        }
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn get_vorhaben(
    Extension(vorhaben): Extension<Arc<VorhabenService>>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<VorhabenSummary>>, (StatusCode, String)> {
    match vorhaben.get(&id).await {
        Ok(summary) => Ok(ResponseJson(ApiResponse::ok(summary))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn create_vorhaben(
    Extension(vorhaben): Extension<Arc<VorhabenService>>,
    Json(payload): Json<CreateVorhabenRequest>,
) -> Result<ResponseJson<ApiResponse<VorhabenSummary>>, (StatusCode, String)> {
    if let Err(validation_errors) = payload.validate() {
        return Err(validation_error_response(validation_errors));
    }

    match vorhaben.create(payload).await {
        Ok(summary) => Ok(ResponseJson(ApiResponse::success(
            summary,
            "Vorhaben created successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn update_vorhaben(
    Extension(vorhaben): Extension<Arc<VorhabenService>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateVorhabenRequest>,
) -> Result<ResponseJson<ApiResponse<VorhabenSummary>>, (StatusCode, String)> {
    if let Err(validation_errors) = payload.validate() {
        return Err(validation_error_response(validation_errors));
    }

    match vorhaben.update(&id, payload).await {
        Ok(summary) => Ok(ResponseJson(ApiResponse::success(
            summary,
            "Vorhaben updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn delete_vorhaben(
    Extension(vorhaben): Extension<Arc<VorhabenService>>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<()>>, (StatusCode, String)> {
    match vorhaben.delete(&id).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success(
            (),
            "Vorhaben deleted successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
