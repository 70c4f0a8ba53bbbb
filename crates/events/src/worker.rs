//! Push dispatch worker.
//!
//! [`PushWorker`] subscribes to the [`EventBus`](crate::EventBus), picks out
//! the events that carry a push batch, and hands each batch to a
//! [`PushTransport`]. Delivery runs off the request path: a failed dispatch
//! is logged and never reaches the operation that published the event.

use std::sync::Arc;

use hearth_core::notification::PUSH_EVENT_TYPES;
use hearth_db::repositories::DeviceRepo;
use hearth_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;
use crate::delivery::{DeliveryReport, PushTransport};

/// Background consumer that dispatches push notifications.
pub struct PushWorker {
    transport: Arc<dyn PushTransport>,
    /// When set, tokens the gateway reports as unregistered are deleted.
    pool: Option<DbPool>,
}

impl PushWorker {
    pub fn new(transport: Arc<dyn PushTransport>) -> Self {
        Self {
            transport,
            pool: None,
        }
    }

    /// Prune unregistered device tokens through `pool`.
    pub fn with_pool(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Run the dispatch loop until the bus is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.handle(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Push worker lagged, some notifications were dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, push worker shutting down");
                    break;
                }
            }
        }
    }

    /// Dispatch the batch carried by `event`.
    ///
    /// Returns `None` when the event carries nothing to send or the
    /// dispatch failed.
    pub async fn handle(&self, event: &PlatformEvent) -> Option<DeliveryReport> {
        if !PUSH_EVENT_TYPES.contains(&event.event_type.as_str()) {
            return None;
        }

        let messages = match event.notifications() {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_type = %event.event_type,
                    "Malformed notification batch, skipping"
                );
                return None;
            }
        };
        if messages.is_empty() {
            return None;
        }

        let report = match self.transport.send(&messages).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_type = %event.event_type,
                    source_entity_id = ?event.source_entity_id,
                    count = messages.len(),
                    "Push dispatch failed"
                );
                return None;
            }
        };

        for failure in &report.failures {
            tracing::warn!(
                to = %failure.to,
                message = %failure.message,
                "Push message rejected by gateway"
            );
        }
        tracing::debug!(
            event_type = %event.event_type,
            delivered = report.delivered,
            failed = report.failures.len(),
            "Push batch dispatched"
        );

        self.prune(&report).await;
        Some(report)
    }

    async fn prune(&self, report: &DeliveryReport) {
        let Some(pool) = &self.pool else {
            return;
        };
        let tokens = report.unregistered_tokens();
        if tokens.is_empty() {
            return;
        }
        match DeviceRepo::delete_tokens(pool, &tokens).await {
            Ok(removed) => tracing::info!(removed, "Pruned unregistered push tokens"),
            Err(e) => tracing::error!(error = %e, "Failed to prune unregistered push tokens"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use hearth_core::notification::{PushMessage, EVENT_TASK_PEOPLE_SYNCED, EVENT_TASK_REMINDER};

    use super::*;
    use crate::bus::EventBus;
    use crate::delivery::{DeliveryFailure, PushError};

    /// Records every batch; fails when `fail` is set.
    #[derive(Default)]
    struct FakeTransport {
        batches: Mutex<Vec<Vec<PushMessage>>>,
        fail: bool,
    }

    #[async_trait]
    impl PushTransport for FakeTransport {
        async fn send(&self, messages: &[PushMessage]) -> Result<DeliveryReport, PushError> {
            self.batches.lock().unwrap().push(messages.to_vec());
            if self.fail {
                return Err(PushError::HttpStatus(503));
            }
            Ok(DeliveryReport {
                delivered: messages.len() - 1,
                failures: vec![DeliveryFailure {
                    to: messages[0].to.clone(),
                    message: "gone".to_string(),
                    unregistered: true,
                }],
            })
        }
    }

    fn message(to: &str) -> PushMessage {
        PushMessage {
            to: to.to_string(),
            title: "Task due soon".to_string(),
            body: "\"Bins\" is due at 18:00 UTC".to_string(),
            data: serde_json::json!({"task_id": 9}),
        }
    }

    #[tokio::test]
    async fn dispatches_push_events() {
        let transport = Arc::new(FakeTransport::default());
        let worker = PushWorker::new(transport.clone());

        let event = PlatformEvent::new(EVENT_TASK_REMINDER)
            .with_notifications(&[message("a"), message("b")]);
        let report = worker.handle(&event).await.expect("batch should be sent");

        assert_eq!(report.delivered, 1);
        assert_eq!(report.unregistered_tokens(), vec!["a".to_string()]);
        assert_eq!(transport.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ignores_other_events_and_empty_batches() {
        let transport = Arc::new(FakeTransport::default());
        let worker = PushWorker::new(transport.clone());

        let unrelated = PlatformEvent::new("task.created").with_notifications(&[message("a")]);
        assert!(worker.handle(&unrelated).await.is_none());

        let empty = PlatformEvent::new(EVENT_TASK_PEOPLE_SYNCED);
        assert!(worker.handle(&empty).await.is_none());

        assert!(transport.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_swallowed() {
        let transport = Arc::new(FakeTransport {
            fail: true,
            ..Default::default()
        });
        let worker = PushWorker::new(transport.clone());

        let event =
            PlatformEvent::new(EVENT_TASK_PEOPLE_SYNCED).with_notifications(&[message("a")]);
        assert!(worker.handle(&event).await.is_none());
        assert_eq!(transport.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn run_drains_bus_and_stops_when_closed() {
        let transport = Arc::new(FakeTransport::default());
        let bus = EventBus::default();
        let receiver = bus.subscribe();
        let handle = tokio::spawn(PushWorker::new(transport.clone()).run(receiver));

        bus.publish(
            PlatformEvent::new(EVENT_TASK_PEOPLE_SYNCED).with_notifications(&[message("a")]),
        );
        bus.publish(PlatformEvent::new(EVENT_TASK_REMINDER).with_notifications(&[message("b")]));
        drop(bus);

        handle.await.expect("worker should exit cleanly");
        let batches = transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1][0].to, "b");
    }
}
