//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`PlatformEvent`]s out to every subscriber. Share it
//! as `Arc<EventBus>`; the push worker exits once the last sender is dropped.

use chrono::{DateTime, Utc};
use hearth_core::notification::{PushMessage, PAYLOAD_NOTIFICATIONS};
use hearth_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event, e.g. a committed task people sync.
///
/// Built with [`PlatformEvent::new`] plus the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"task.people_synced"`.
    pub event_type: String,

    /// Source entity kind (`"task"`, `"category"`, ...).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Person whose request caused the event. `None` for scheduled events.
    pub actor_person_id: Option<DbId>,

    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_person_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, person_id: DbId) -> Self {
        self.actor_person_id = Some(person_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attach a push batch under the `notifications` payload key.
    pub fn with_notifications(mut self, messages: &[PushMessage]) -> Self {
        let batch = serde_json::to_value(messages).unwrap_or_default();
        if !self.payload.is_object() {
            self.payload = serde_json::Value::Object(Default::default());
        }
        if let Some(map) = self.payload.as_object_mut() {
            map.insert(PAYLOAD_NOTIFICATIONS.to_string(), batch);
        }
        self
    }

    /// The push batch carried by this event, if any.
    ///
    /// A missing key yields an empty batch; a malformed one is an error.
    pub fn notifications(&self) -> Result<Vec<PushMessage>, serde_json::Error> {
        match self.payload.get(PAYLOAD_NOTIFICATIONS) {
            Some(value) => Vec::<PushMessage>::deserialize(value),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of [`PlatformEvent`]s to every live subscriber.
///
/// ```rust
/// use hearth_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new("task.people_synced"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Bus buffering up to `capacity` events per subscriber. Past that, the
    /// oldest events are overwritten and the subscriber sees `Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send to current subscribers; with none, the event is dropped.
    pub fn publish(&self, event: PlatformEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hearth_core::notification::EVENT_TASK_PEOPLE_SYNCED;

    use super::*;

    fn message(to: &str) -> PushMessage {
        PushMessage {
            to: to.to_string(),
            title: "New task".to_string(),
            body: "You were added".to_string(),
            data: serde_json::json!({"task_id": 1}),
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(
            PlatformEvent::new(EVENT_TASK_PEOPLE_SYNCED)
                .with_source("task", 42)
                .with_actor(7),
        );

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.event_type, EVENT_TASK_PEOPLE_SYNCED);
        assert_eq!(e2.source_entity_id, Some(42));
        assert_eq!(e2.actor_person_id, Some(7));
    }

    #[tokio::test]
    async fn slow_subscriber_lags_and_resumes_at_oldest_kept() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for id in 0..4 {
            bus.publish(PlatformEvent::new("task.reminder").with_source("task", id));
        }

        assert_matches!(rx.recv().await, Err(broadcast::error::RecvError::Lagged(2)));
        let next = rx.recv().await.expect("oldest kept event");
        assert_eq!(next.source_entity_id, Some(2));
    }

    #[test]
    fn events_without_subscribers_are_dropped() {
        let bus = EventBus::new(4);
        bus.publish(PlatformEvent::new("task.reminder"));
        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn notifications_round_trip_through_payload() {
        let event = PlatformEvent::new(EVENT_TASK_PEOPLE_SYNCED)
            .with_payload(serde_json::json!({"task_id": 3}))
            .with_notifications(&[message("tok-a"), message("tok-b")]);

        assert_eq!(event.payload["task_id"], 3);
        let batch = event.notifications().expect("batch should parse");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].to, "tok-b");
    }

    #[test]
    fn missing_notifications_is_an_empty_batch() {
        let event = PlatformEvent::new("task.created");
        assert!(event.notifications().expect("parse").is_empty());
    }

    #[test]
    fn malformed_notifications_are_an_error() {
        let event = PlatformEvent::new(EVENT_TASK_PEOPLE_SYNCED)
            .with_payload(serde_json::json!({"notifications": [{"to": 1}]}));
        assert!(event.notifications().is_err());
    }
}
