//! Campaign Dialer Microservice
//!
//! Outbound AI-voice calling over the Vapi API:
//! - Batch call dispatch with staggered pacing
//! - Campaign queue processor with calling windows and retry ceilings
//! - Call-lifecycle webhooks (end-of-call reports, status updates)
//! - Guarded contact state machine backed by PostgreSQL
//! - Best-effort email alerting for long calls and gateway errors

mod call_logs;
mod campaigns;
mod config;
mod contacts;
mod dispatcher;
mod error;
mod handlers;
#[cfg(test)]
mod lifecycle_tests;
mod notify;
mod queue;
mod routes;
mod store;
#[cfg(test)]
mod testing;
mod vapi;
mod webhook;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

pub use config::Config;
pub use error::{Error, Result};

use dispatcher::{DispatchDefaults, Dispatcher};
use notify::Notifier;
use queue::QueueProcessor;
use store::{DialerStore, PgStore};
use vapi::{CallGateway, VapiClient};
use webhook::WebhookProcessor;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: outdial_db::DbPool,
    pub store: Arc<dyn DialerStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub webhook: Arc<WebhookProcessor>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    outdial_telemetry::init("campaign-dialer")?;

    info!("Starting Campaign Dialer microservice");

    let config = Config::from_env()?;
    let bind_addr = config.bind_address()?;

    let db = outdial_db::DbPool::new(outdial_db::PoolConfig::from_env()).await?;
    let store: Arc<dyn DialerStore> = Arc::new(PgStore::new(db.clone()));

    let gateway: Arc<dyn CallGateway> = Arc::new(VapiClient::new(
        config.vapi_base_url.clone(),
        config.vapi_api_key.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?);

    let notifier = Arc::new(Notifier::from_config(config.smtp.as_ref()));

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&store),
        Arc::clone(&gateway),
        Arc::clone(&notifier),
        DispatchDefaults {
            assistant_id: config.default_assistant_id.clone(),
            phone_number_id: config.default_phone_number_id.clone(),
            stagger: Duration::from_secs(config.call_stagger_secs),
        },
    ));

    let webhook = Arc::new(WebhookProcessor::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        config.default_max_attempts,
    ));

    if config.queue_enabled {
        let processor = QueueProcessor::new(
            Arc::clone(&store),
            Arc::clone(&gateway),
            Arc::clone(&notifier),
            Duration::from_secs(config.queue_poll_secs),
        );
        tokio::spawn(processor.run());
    } else {
        info!("Queue processor disabled");
    }

    let state = AppState {
        db,
        store,
        dispatcher,
        webhook,
    };

    let app = routes::create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Campaign Dialer listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
