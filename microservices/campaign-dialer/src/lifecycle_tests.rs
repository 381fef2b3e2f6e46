//! Full dial-to-report lifecycle tests over the in-memory store and fake
//! gateway: dispatch, provider report, retry, exhaustion.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::dispatcher::{DispatchDefaults, Dispatcher};
use crate::notify::Notifier;
use crate::store::memory::MemoryStore;
use crate::store::DialerStore;
use crate::testing::contact;
use crate::vapi::fake::FakeGateway;
use crate::webhook::WebhookProcessor;
use outdial_core::ContactStatus;

struct Harness {
    store: Arc<MemoryStore>,
    gateway: Arc<FakeGateway>,
    dispatcher: Dispatcher,
    webhook: WebhookProcessor,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let notifier = Arc::new(Notifier::disabled());
        let dispatcher = Dispatcher::new(
            Arc::clone(&store) as Arc<dyn DialerStore>,
            Arc::clone(&gateway) as Arc<dyn crate::vapi::CallGateway>,
            Arc::clone(&notifier),
            DispatchDefaults {
                assistant_id: "asst_default".into(),
                phone_number_id: "pn_default".into(),
                stagger: Duration::from_secs(30),
            },
        );
        let webhook = WebhookProcessor::new(
            Arc::clone(&store) as Arc<dyn DialerStore>,
            notifier,
            2,
        );
        Self {
            store,
            gateway,
            dispatcher,
            webhook,
        }
    }

    async fn report(&self, vapi_call_id: &str, ended_reason: &str) {
        let payload = json!({
            "message": {
                "type": "end-of-call-report",
                "call": {"id": vapi_call_id, "duration": 12.0},
                "endedReason": ended_reason
            }
        });
        let ack = self.webhook.process(&payload).await;
        assert!(ack.received);
    }
}

#[tokio::test]
async fn calls_are_dispatched_reported_and_retried_to_exhaustion() {
    let h = Harness::new();
    let a = contact("555-123-4567", ContactStatus::Pending);
    let b = contact("1-555-987-6543", ContactStatus::Pending);
    h.store.add_contact(a.clone());
    h.store.add_contact(b.clone());

    // First batch: both numbers normalized, both claimed, two logs.
    let summary = h
        .dispatcher
        .dispatch_batch(&[a.id, b.id], None)
        .await
        .unwrap();
    assert!(summary.success);

    let requests = h.gateway.requests();
    assert_eq!(requests[0].customer_number, "+15551234567");
    assert_eq!(requests[1].customer_number, "+15559876543");
    assert_eq!(h.store.call_logs().len(), 2);
    assert_eq!(h.store.contact(a.id).status, ContactStatus::Calling);
    assert_eq!(h.store.contact(b.id).status, ContactStatus::Calling);

    let a_call = h.store.call_logs()[0].vapi_call_id.clone();
    let b_call = h.store.call_logs()[1].vapi_call_id.clone();

    // First contact answers.
    h.report(&a_call, "customer-ended-call").await;
    let after_a = h.store.contact(a.id);
    assert_eq!(after_a.status, ContactStatus::Answered);
    assert_eq!(after_a.outcome.as_deref(), Some("answered"));

    // Second contact does not answer: one attempt used, still retryable.
    h.report(&b_call, "customer-did-not-answer").await;
    let after_b = h.store.contact(b.id);
    assert_eq!(after_b.status, ContactStatus::NoAnswer);
    assert_eq!(after_b.call_count, 1);

    // Retry the non-answer; the answered contact is no longer dialable.
    let retry = h
        .dispatcher
        .dispatch_batch(&[a.id, b.id], None)
        .await
        .unwrap();
    assert!(!retry.success);
    assert_eq!(h.store.contact(a.id).status, ContactStatus::Answered);
    assert_eq!(h.store.contact(b.id).call_count, 2);

    // Second non-answer hits the attempt ceiling.
    let b_retry_call = h.store.call_logs()[2].vapi_call_id.clone();
    h.report(&b_retry_call, "customer-did-not-answer").await;

    let exhausted = h.store.contact(b.id);
    assert_eq!(exhausted.status, ContactStatus::Exhausted);
    assert_eq!(exhausted.outcome.as_deref(), Some("no_answer"));
}

#[tokio::test]
async fn replayed_report_converges_to_the_same_state() {
    let h = Harness::new();
    let a = contact("5551234567", ContactStatus::Pending);
    h.store.add_contact(a.clone());

    h.dispatcher.dispatch_batch(&[a.id], None).await.unwrap();
    let call_id = h.store.call_logs()[0].vapi_call_id.clone();

    h.report(&call_id, "voicemail").await;
    h.report(&call_id, "voicemail").await;

    let after = h.store.contact(a.id);
    assert_eq!(after.status, ContactStatus::Voicemail);
    assert_eq!(after.call_count, 1);
    assert_eq!(h.store.call_logs().len(), 1);
    assert_eq!(
        h.store.call_logs()[0].ended_reason.as_deref(),
        Some("voicemail")
    );
}
