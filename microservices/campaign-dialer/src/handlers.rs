//! HTTP handlers for the Campaign Dialer API

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::dispatcher::DispatchSummary;
use crate::webhook::WebhookAck;
use crate::{AppState, Error, Result};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub db_connected: bool,
}

/// Ready check response
#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub database: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_connected = state.db.is_healthy().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "campaign-dialer".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        db_connected,
    })
}

pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let db_ok = state.db.is_healthy().await;

    Json(ReadyResponse {
        ready: db_ok,
        database: db_ok,
    })
}

// ============================================
// Call Dispatch
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallsRequest {
    #[serde(default)]
    pub contact_ids: Vec<Uuid>,
    pub campaign_id: Option<Uuid>,
}

pub async fn create_calls(
    State(state): State<AppState>,
    Json(request): Json<CallsRequest>,
) -> Result<Json<DispatchSummary>> {
    if request.contact_ids.is_empty() {
        return Err(Error::InvalidRequest("contactIds is required".to_string()));
    }

    let campaign = match request.campaign_id {
        Some(id) => Some(
            state
                .store
                .campaign_by_id(id)
                .await?
                .ok_or_else(|| Error::CampaignNotFound(id.to_string()))?,
        ),
        None => None,
    };

    let summary = state
        .dispatcher
        .dispatch_batch(&request.contact_ids, campaign.as_ref())
        .await?;

    Ok(Json(summary))
}

// ============================================
// Provider Webhooks
// ============================================

/// Always answers 200: the provider retries non-200 responses, and a replay
/// of a call report is worse than a dropped malformed one.
pub async fn call_webhook(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Json<WebhookAck> {
    match payload {
        Ok(Json(payload)) => Json(state.webhook.process(&payload).await),
        Err(rejection) => {
            tracing::error!("Malformed webhook body: {rejection}");
            Json(WebhookAck {
                received: true,
                status: None,
                error: Some("Invalid JSON body".to_string()),
            })
        }
    }
}

/// Provider endpoint verification.
pub async fn call_webhook_verify() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
