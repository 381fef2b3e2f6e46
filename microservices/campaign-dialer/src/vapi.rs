//! Vapi call gateway client
//!
//! Pure translation to the provider's call-creation API: builds the payload,
//! attaches bearer auth, and surfaces non-success responses as errors that
//! carry the HTTP status and body text. Retry policy lives with the callers,
//! never here.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::contacts::Contact;
use crate::{Error, Result};

/// Template variables passed to the assistant. Every field carries a
/// placeholder when the contact has no value; the payload never holds nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct CallVariables {
    pub lead_name: String,
    pub company_name: String,
    pub location: String,
    pub industry: String,
}

impl CallVariables {
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            lead_name: contact
                .first_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "there".to_string()),
            company_name: contact
                .company
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "your company".to_string()),
            location: contact.location.clone().unwrap_or_default(),
            industry: contact
                .industry
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "business".to_string()),
        }
    }
}

/// Abstract call-creation request.
#[derive(Debug, Clone)]
pub struct CreateCallRequest {
    pub assistant_id: String,
    pub phone_number_id: String,
    pub customer_number: String,
    pub variables: CallVariables,
    /// Future-dated execution for staggered batches.
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Response from the provider on call creation.
#[derive(Debug, Clone, Deserialize)]
pub struct VapiCallResponse {
    pub id: String,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Seam for the voice-call provider, so dispatch logic is testable without
/// the network.
#[async_trait]
pub trait CallGateway: Send + Sync {
    async fn create_call(&self, request: &CreateCallRequest) -> Result<VapiCallResponse>;
}

/// HTTP client for the Vapi API.
pub struct VapiClient {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl VapiClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            http_client,
        })
    }

    fn to_payload(request: &CreateCallRequest) -> serde_json::Value {
        let mut payload = json!({
            "assistantId": request.assistant_id,
            "phoneNumberId": request.phone_number_id,
            "customer": {
                "number": request.customer_number
            },
            "assistantOverrides": {
                "variableValues": {
                    "leadName": request.variables.lead_name,
                    "companyName": request.variables.company_name,
                    "location": request.variables.location,
                    "industry": request.variables.industry
                }
            }
        });

        if let Some(scheduled_at) = request.scheduled_at {
            payload["scheduledAt"] = json!(scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true));
        }

        payload
    }
}

#[async_trait]
impl CallGateway for VapiClient {
    async fn create_call(&self, request: &CreateCallRequest) -> Result<VapiCallResponse> {
        let payload = Self::to_payload(request);

        let response = self
            .http_client
            .post(format!("{}/call", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let created: VapiCallResponse = response.json().await?;
        tracing::debug!(
            call_id = %created.id,
            status = %created.status,
            created_at = %created.created_at,
            "Provider call created"
        );
        Ok(created)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory gateway for dispatch tests.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub struct FakeGateway {
        /// Requests received, in order.
        pub requests: Mutex<Vec<CreateCallRequest>>,
        /// Fail the nth call (0-based) and every one after it.
        pub fail_from: Option<usize>,
        counter: AtomicUsize,
    }

    impl FakeGateway {
        pub fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_from: None,
                counter: AtomicUsize::new(0),
            }
        }

        pub fn failing_from(index: usize) -> Self {
            Self {
                fail_from: Some(index),
                ..Self::new()
            }
        }

        pub fn requests(&self) -> Vec<CreateCallRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CallGateway for FakeGateway {
        async fn create_call(&self, request: &CreateCallRequest) -> Result<VapiCallResponse> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());

            if self.fail_from.is_some_and(|from| n >= from) {
                return Err(Error::Gateway {
                    status: 400,
                    body: "number unreachable".to_string(),
                });
            }

            Ok(VapiCallResponse {
                id: format!("call-{n}"),
                status: "queued".to_string(),
                created_at: Utc::now().to_rfc3339(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> CreateCallRequest {
        CreateCallRequest {
            assistant_id: "asst-1".to_string(),
            phone_number_id: "pn-1".to_string(),
            customer_number: "+15551234567".to_string(),
            variables: CallVariables {
                lead_name: "Ada".to_string(),
                company_name: "Acme".to_string(),
                location: "Austin".to_string(),
                industry: "software".to_string(),
            },
            scheduled_at: None,
        }
    }

    fn test_contact() -> Contact {
        Contact {
            id: Uuid::new_v4(),
            campaign_id: None,
            phone: "555-123-4567".to_string(),
            first_name: None,
            last_name: None,
            company: Some("".to_string()),
            location: None,
            industry: None,
            status: outdial_core::ContactStatus::Pending,
            outcome: None,
            call_count: 0,
            last_attempt_at: None,
            next_attempt_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_variables_default_placeholders() {
        let vars = CallVariables::from_contact(&test_contact());
        assert_eq!(vars.lead_name, "there");
        assert_eq!(vars.company_name, "your company");
        assert_eq!(vars.location, "");
        assert_eq!(vars.industry, "business");
    }

    #[test]
    fn test_payload_shape() {
        let mut request = test_request();
        request.scheduled_at = Some(Utc.with_ymd_and_hms(2024, 6, 3, 15, 30, 0).unwrap());

        let payload = VapiClient::to_payload(&request);
        assert_eq!(payload["assistantId"], "asst-1");
        assert_eq!(payload["phoneNumberId"], "pn-1");
        assert_eq!(payload["customer"]["number"], "+15551234567");
        assert_eq!(
            payload["assistantOverrides"]["variableValues"]["leadName"],
            "Ada"
        );
        assert_eq!(payload["scheduledAt"], "2024-06-03T15:30:00Z");

        let payload = VapiClient::to_payload(&test_request());
        assert!(payload.get("scheduledAt").is_none());
    }

    #[tokio::test]
    async fn test_create_call_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "customer": { "number": "+15551234567" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "call-abc",
                "status": "queued",
                "createdAt": "2024-06-03T15:30:00Z"
            })))
            .mount(&server)
            .await;

        let client = VapiClient::new(
            server.uri(),
            "test-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let response = client.create_call(&test_request()).await.unwrap();
        assert_eq!(response.id, "call-abc");
        assert_eq!(response.status, "queued");
    }

    #[tokio::test]
    async fn test_create_call_error_carries_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/call"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad number"))
            .mount(&server)
            .await;

        let client = VapiClient::new(
            server.uri(),
            "test-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client.create_call(&test_request()).await.unwrap_err();
        match err {
            Error::Gateway { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad number");
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }
}
