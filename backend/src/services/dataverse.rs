//! Thin generic client for the Dataverse Web API.
//!
//! Wraps the OData endpoint with list/get/create/update/delete calls over
//! JSON. This is deliberately not a general OData implementation: entity-set
//! URLs, the common `$select`/`$filter`/`$expand`/`$orderby`/`$top` query
//! options and the Dataverse headers are all the typed services need. Every
//! call obtains its bearer token from the auth service, which refreshes
//! transparently when needed.

use crate::auth::service::AuthService;
use crate::errors::{ServiceError, ServiceResult};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

const API_PATH: &str = "api/data/v9.2";

/// Query options for list calls. All fields are raw OData fragments.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub select: Option<String>,
    pub filter: Option<String>,
    pub expand: Option<String>,
    pub order_by: Option<String>,
    pub top: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    value: Vec<Value>,
}

/// Dataverse error envelope, `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Generic REST client for one Dataverse environment.
pub struct DataverseClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthService>,
}

impl DataverseClient {
    pub fn new(base_url: impl Into<String>, auth: Arc<AuthService>) -> Self {
        DataverseClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }

    /// Lists records of an entity set.
    pub async fn list(&self, entity_set: &str, query: &ListQuery) -> ServiceResult<Vec<Value>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(select) = &query.select {
            params.push(("$select", select.clone()));
        }
        if let Some(filter) = &query.filter {
            params.push(("$filter", filter.clone()));
        }
        if let Some(expand) = &query.expand {
            params.push(("$expand", expand.clone()));
        }
        if let Some(order_by) = &query.order_by {
            params.push(("$orderby", order_by.clone()));
        }
        if let Some(top) = query.top {
            params.push(("$top", top.to_string()));
        }

        let request = self
            .request(Method::GET, entity_set)
            .await?
            .query(&params);
        let response = Self::check(entity_set, self.send(request, entity_set).await?).await?;

        let parsed: ListResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::external_service(format!("Malformed list response: {}", e)))?;
        Ok(parsed.value)
    }

    /// Fetches a single record by id.
    pub async fn get(&self, entity_set: &str, id: &str, select: Option<&str>) -> ServiceResult<Value> {
        let resource = format!("{}({})", entity_set, id);
        let mut request = self.request(Method::GET, &resource).await?;
        if let Some(select) = select {
            request = request.query(&[("$select", select)]);
        }

        let response = Self::check(&resource, self.send(request, &resource).await?).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::external_service(format!("Malformed record response: {}", e)))
    }

    /// Creates a record and returns its representation.
    pub async fn create(&self, entity_set: &str, body: &Value) -> ServiceResult<Value> {
        let request = self
            .request(Method::POST, entity_set)
            .await?
            .header("Prefer", "return=representation")
            .json(body);

        let response = Self::check(entity_set, self.send(request, entity_set).await?).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::external_service(format!("Malformed record response: {}", e)))
    }

    /// Updates fields of an existing record.
    pub async fn update(&self, entity_set: &str, id: &str, body: &Value) -> ServiceResult<()> {
        let resource = format!("{}({})", entity_set, id);
        let request = self
            .request(Method::PATCH, &resource)
            .await?
            // Update only; never upsert a record under a caller-chosen id.
            .header("If-Match", "*")
            .json(body);

        Self::check(&resource, self.send(request, &resource).await?).await?;
        Ok(())
    }

    /// Deletes a record.
    pub async fn delete(&self, entity_set: &str, id: &str) -> ServiceResult<()> {
        let resource = format!("{}({})", entity_set, id);
        let request = self.request(Method::DELETE, &resource).await?;
        Self::check(&resource, self.send(request, &resource).await?).await?;
        Ok(())
    }

    async fn request(&self, method: Method, resource: &str) -> ServiceResult<reqwest::RequestBuilder> {
        let token = self.auth.get_valid_token().await?;
        let url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            API_PATH,
            resource
        );

        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .header("Accept", "application/json"))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> ServiceResult<reqwest::Response> {
        request.send().await.map_err(|e| {
            error!(resource, "Dataverse request failed: {}", e);
            ServiceError::external_service(format!("Dataverse request failed: {}", e))
        })
    }

    async fn check(resource: &str, response: reqwest::Response) -> ServiceResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("Dataverse returned {}", status));

        Err(match status {
            StatusCode::NOT_FOUND => ServiceError::not_found("Record", resource),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ServiceError::unauthorized(message)
            }
            StatusCode::BAD_REQUEST => ServiceError::validation(message),
            _ => {
                error!(resource, %status, "Dataverse error: {}", message);
                ServiceError::external_service(message)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Credential;
    use crate::auth::service::AuthConfig;
    use crate::repositories::credential_repository::MemoryCredentialStore;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DataverseClient {
        let credential = Credential {
            access_token: "test-access-token".to_string(),
            refresh_token: "test-refresh-token".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
            resource: server.uri(),
        };
        let auth = AuthService::new(
            AuthConfig {
                device_code_url: format!("{}/oauth2/devicecode", server.uri()),
                token_url: format!("{}/oauth2/token", server.uri()),
                client_id: "client".to_string(),
                resource: server.uri(),
            },
            Arc::new(MemoryCredentialStore::with_credential(credential)),
        );
        DataverseClient::new(server.uri(), Arc::new(auth))
    }

    #[tokio::test]
    async fn test_list_sends_odata_query_and_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data/v9.2/ltp_vorhabens"))
            .and(query_param("$select", "ltp_name"))
            .and(query_param("$top", "10"))
            .and(header("Authorization", "Bearer test-access-token"))
            .and(header("OData-Version", "4.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"ltp_name": "Projekt A"}, {"ltp_name": "Projekt B"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = ListQuery {
            select: Some("ltp_name".to_string()),
            top: Some(10),
            ..Default::default()
        };
        let records = client.list("ltp_vorhabens", &query).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["ltp_name"], "Projekt A");
    }

    #[tokio::test]
    async fn test_get_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"message": "Entity does not exist"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let error = client.get("ltp_vorhabens", "abc", None).await.unwrap_err();
        assert!(matches!(error, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Invalid attribute ltp_unknown"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let error = client
            .update("ltp_vorhabens", "abc", &json!({"ltp_unknown": 1}))
            .await
            .unwrap_err();
        match error {
            ServiceError::Validation { message } => {
                assert_eq!(message, "Invalid attribute ltp_unknown")
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}
