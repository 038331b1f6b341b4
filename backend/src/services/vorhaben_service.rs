//! Typed service for the Vorhaben entity.
//!
//! Wraps the generic Dataverse client with the Vorhaben entity set, maps
//! the raw OData field names onto the API models, and annotates every
//! record with its classified pipeline phase. The stage id from the linked
//! process flow wins over the lifecycle-status code when both are present;
//! neither upstream source is authoritative on its own.

use crate::api::vorhaben::models::{CreateVorhabenRequest, UpdateVorhabenRequest, VorhabenSummary};
use crate::errors::{ServiceError, ServiceResult};
use crate::services::dataverse::{DataverseClient, ListQuery};
use crate::services::phase_classifier::{self, Phase, PhaseRanges};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

const ENTITY_SET: &str = "ltp_vorhabens";

const SELECT_FIELDS: &str = "ltp_vorhabenid,ltp_name,ltp_typ,ltp_lifecyclestatus,\
                             ltp_kritikalitaet,ltp_komplexitaet,ltp_planungsstart,\
                             ltp_planungsende,_stageid_value";

/// Hard cap on one upstream page; phase filtering happens in memory.
const LIST_TOP: u32 = 500;

/// Raw Vorhaben record as returned by the Dataverse Web API.
#[derive(Debug, Deserialize)]
pub struct VorhabenRecord {
    #[serde(rename = "ltp_vorhabenid")]
    pub id: String,
    #[serde(rename = "ltp_name")]
    pub name: Option<String>,
    #[serde(rename = "ltp_typ")]
    pub typ: Option<i64>,
    #[serde(rename = "ltp_lifecyclestatus")]
    pub lifecycle_status: Option<i64>,
    #[serde(rename = "ltp_kritikalitaet")]
    pub kritikalitaet: Option<i64>,
    #[serde(rename = "ltp_komplexitaet")]
    pub komplexitaet: Option<i64>,
    #[serde(rename = "ltp_planungsstart")]
    pub planungsstart: Option<NaiveDate>,
    #[serde(rename = "ltp_planungsende")]
    pub planungsende: Option<NaiveDate>,
    /// Active process-flow stage, when a flow instance exists.
    #[serde(rename = "_stageid_value")]
    pub stage_id: Option<String>,
}

pub struct VorhabenService {
    client: Arc<DataverseClient>,
    phase_ranges: PhaseRanges,
}

impl VorhabenService {
    pub fn new(client: Arc<DataverseClient>, phase_ranges: PhaseRanges) -> Self {
        VorhabenService {
            client,
            phase_ranges,
        }
    }

    /// Lists Vorhaben, annotated and optionally restricted to one phase.
    ///
    /// The Typ restriction is pushed down as an OData filter; the phase
    /// restriction is applied in memory since phases are derived, not
    /// stored upstream.
    pub async fn list(
        &self,
        typ: Option<i64>,
        phase: Option<Phase>,
    ) -> ServiceResult<Vec<VorhabenSummary>> {
        let query = ListQuery {
            select: Some(SELECT_FIELDS.to_string()),
            filter: typ.map(|code| format!("ltp_typ eq {}", code)),
            order_by: Some("ltp_name asc".to_string()),
            top: Some(LIST_TOP),
            ..Default::default()
        };

        let records = self.client.list(ENTITY_SET, &query).await?;
        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let summary = self.summarize(parse_record(record)?);
            if phase.is_none() || phase.map(|p| p.code()) == Some(summary.phase) {
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }

    /// Fetches a single Vorhaben by id.
    pub async fn get(&self, id: &str) -> ServiceResult<VorhabenSummary> {
        let record = self
            .client
            .get(ENTITY_SET, id, Some(SELECT_FIELDS))
            .await?;
        Ok(self.summarize(parse_record(record)?))
    }

    /// Creates a Vorhaben and returns the stored representation.
    pub async fn create(&self, request: CreateVorhabenRequest) -> ServiceResult<VorhabenSummary> {
        let body = json!({
            "ltp_name": request.name,
            "ltp_typ": request.typ,
            "ltp_lifecyclestatus": request.lifecycle_status,
            "ltp_kritikalitaet": request.kritikalitaet,
            "ltp_komplexitaet": request.komplexitaet,
            "ltp_planungsstart": request.planungsstart,
            "ltp_planungsende": request.planungsende,
        });

        let record = self.client.create(ENTITY_SET, &body).await?;
        Ok(self.summarize(parse_record(record)?))
    }

    /// Applies a partial update, then returns the refreshed record.
    pub async fn update(
        &self,
        id: &str,
        request: UpdateVorhabenRequest,
    ) -> ServiceResult<VorhabenSummary> {
        let body = update_body(&request);
        if body.is_empty() {
            return Err(ServiceError::validation("No fields to update"));
        }

        self.client
            .update(ENTITY_SET, id, &Value::Object(body))
            .await?;
        self.get(id).await
    }

    /// Deletes a Vorhaben.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.client.delete(ENTITY_SET, id).await
    }

    fn summarize(&self, record: VorhabenRecord) -> VorhabenSummary {
        let phase = phase_classifier::classify(
            &self.phase_ranges,
            record.stage_id.as_deref(),
            record.lifecycle_status,
        );

        VorhabenSummary {
            id: record.id,
            name: record.name,
            typ: record.typ,
            lifecycle_status: record.lifecycle_status,
            kritikalitaet: record.kritikalitaet,
            komplexitaet: record.komplexitaet,
            planungsstart: record.planungsstart,
            planungsende: record.planungsende,
            phase: phase.code(),
            phase_label: phase.label().to_string(),
        }
    }
}

fn parse_record(record: Value) -> ServiceResult<VorhabenRecord> {
    serde_json::from_value(record)
        .map_err(|e| ServiceError::external_service(format!("Malformed Vorhaben record: {}", e)))
}

fn update_body(request: &UpdateVorhabenRequest) -> Map<String, Value> {
    let mut body = Map::new();
    if let Some(name) = &request.name {
        body.insert("ltp_name".to_string(), json!(name));
    }
    if let Some(typ) = request.typ {
        body.insert("ltp_typ".to_string(), json!(typ));
    }
    if let Some(status) = request.lifecycle_status {
        body.insert("ltp_lifecyclestatus".to_string(), json!(status));
    }
    if let Some(kritikalitaet) = request.kritikalitaet {
        body.insert("ltp_kritikalitaet".to_string(), json!(kritikalitaet));
    }
    if let Some(komplexitaet) = request.komplexitaet {
        body.insert("ltp_komplexitaet".to_string(), json!(komplexitaet));
    }
    if let Some(start) = request.planungsstart {
        body.insert("ltp_planungsstart".to_string(), json!(start));
    }
    if let Some(end) = request.planungsende {
        body.insert("ltp_planungsende".to_string(), json!(end));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Credential;
    use crate::auth::service::{AuthConfig, AuthService};
    use crate::repositories::credential_repository::MemoryCredentialStore;
    use chrono::{Duration, Utc};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> VorhabenService {
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
        let client = Arc::new(DataverseClient::new(server.uri(), Arc::new(auth)));
        VorhabenService::new(client, PhaseRanges::default())
    }

    fn record(id: &str, status: Option<i64>, stage: Option<&str>) -> VorhabenRecord {
        VorhabenRecord {
            id: id.to_string(),
            name: Some(format!("Vorhaben {}", id)),
            typ: Some(562520100),
            lifecycle_status: status,
            kritikalitaet: Some(1),
            komplexitaet: Some(2),
            planungsstart: None,
            planungsende: None,
            stage_id: stage.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_summary_prefers_stage_over_status() {
        let server_less = VorhabenService {
            client: Arc::new(DataverseClient::new(
                "https://example.crm4.dynamics.com",
                Arc::new(AuthService::new(
                    AuthConfig {
                        device_code_url: String::new(),
                        token_url: String::new(),
                        client_id: String::new(),
                        resource: String::new(),
                    },
                    Arc::new(MemoryCredentialStore::new()),
                )),
            )),
            phase_ranges: PhaseRanges::default(),
        };

        // Planung by status code, Umsetzung by stage: stage wins.
        let summary = server_less.summarize(record(
            "a",
            Some(562520007),
            Some("b8209429-fea3-4fde-9440-2bc168bf14b3"),
        ));
        assert_eq!(summary.phase, 4);
        assert_eq!(summary.phase_label, "Umsetzung");

        // No linked flow: the status code decides.
        let summary = server_less.summarize(record("b", Some(562520007), None));
        assert_eq!(summary.phase, 3);
        assert_eq!(summary.phase_label, "Planung");

        // Neither source present: default phase.
        let summary = server_less.summarize(record("c", None, None));
        assert_eq!(summary.phase, 1);
        assert_eq!(summary.phase_label, "Initialisierung");
    }

    #[test]
    fn test_update_body_contains_only_set_fields() {
        let request = UpdateVorhabenRequest {
            name: Some("Umbenannt".to_string()),
            typ: None,
            lifecycle_status: Some(562520004),
            kritikalitaet: None,
            komplexitaet: None,
            planungsstart: None,
            planungsende: None,
        };

        let body = update_body(&request);
        assert_eq!(body.len(), 2);
        assert_eq!(body["ltp_name"], "Umbenannt");
        assert_eq!(body["ltp_lifecyclestatus"], 562520004);
    }

    #[tokio::test]
    async fn test_list_annotates_and_filters_by_phase() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data/v9.2/ltp_vorhabens"))
            .and(query_param("$filter", "ltp_typ eq 562520100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [
                    {
                        "ltp_vorhabenid": "a",
                        "ltp_name": "Projekt A",
                        "ltp_typ": 562520100,
                        "ltp_lifecyclestatus": 562520007
                    },
                    {
                        "ltp_vorhabenid": "b",
                        "ltp_name": "Projekt B",
                        "ltp_typ": 562520100,
                        "ltp_lifecyclestatus": 562520000,
                        "_stageid_value": "B8209429-FEA3-4FDE-9440-2BC168BF14B3"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let service = service_for(&server);

        let all = service.list(Some(562520100), None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].phase_label, "Planung");
        assert_eq!(all[1].phase_label, "Umsetzung");

        let umsetzung = service
            .list(Some(562520100), Some(Phase::Umsetzung))
            .await
            .unwrap();
        assert_eq!(umsetzung.len(), 1);
        assert_eq!(umsetzung[0].id, "b");
    }
}
