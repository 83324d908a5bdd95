//! In-process event bus for task and assignment mutations.
//!
//! Subscribers get a broadcast stream of typed events; consumers that only
//! want a refetch trigger can watch the mutation beacon instead, which
//! carries the timestamp of the most recent mutation (last-write-wins, no
//! replay).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use ts_rs::TS;
use uuid::Uuid;

pub const EVENT_TASK_CREATED: &str = "task.created";
pub const EVENT_TASK_UPDATED: &str = "task.updated";
pub const EVENT_TASK_DELETED: &str = "task.deleted";

pub const EVENT_ASSIGNMENT_CREATED: &str = "assignment.created";
pub const EVENT_ASSIGNMENT_REMOVED: &str = "assignment.removed";

const BROADCAST_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskEventPayload {
    pub task_id: Uuid,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AssignmentEventPayload {
    pub task_id: Uuid,
    pub assignee_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Event {
    pub kind: String,
    pub entity: String,
    pub entity_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// Fan-out channel for mutation events. Delivery is best-effort: lagged
/// subscribers lose messages and there is no replay, matching the advisory
/// semantics of the notification layer this replaces.
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    beacon: watch::Sender<DateTime<Utc>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (beacon, _) = watch::channel(Utc::now());
        Self { sender, beacon }
    }

    pub fn publish(&self, kind: &str, entity: &str, entity_id: Uuid, payload: serde_json::Value) {
        let event = Event {
            kind: kind.to_string(),
            entity: entity.to_string(),
            entity_id,
            timestamp: Utc::now(),
            payload,
        };
        self.beacon.send_replace(event.timestamp);
        // Send only fails when no subscriber is listening, which is fine.
        if self.sender.send(event).is_err() {
            tracing::trace!(kind, %entity_id, "event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Last-mutation timestamp. Consumers refetch when it changes.
    pub fn watch_mutations(&self) -> watch::Receiver<DateTime<Utc>> {
        self.beacon.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let task_id = Uuid::new_v4();
        let payload = serde_json::to_value(TaskEventPayload {
            task_id,
            project_id: Uuid::new_v4(),
        })
        .unwrap();
        bus.publish(EVENT_TASK_CREATED, "task", task_id, payload);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EVENT_TASK_CREATED);
        assert_eq!(event.entity, "task");
        assert_eq!(event.entity_id, task_id);
        assert_eq!(event.payload["task_id"], serde_json::json!(task_id));
    }

    #[tokio::test]
    async fn beacon_advances_on_publish() {
        let bus = EventBus::new();
        let mut beacon = bus.watch_mutations();
        let before = *beacon.borrow_and_update();

        bus.publish(
            EVENT_TASK_DELETED,
            "task",
            Uuid::new_v4(),
            serde_json::Value::Null,
        );

        beacon.changed().await.unwrap();
        assert!(*beacon.borrow() >= before);
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(
            EVENT_TASK_UPDATED,
            "task",
            Uuid::new_v4(),
            serde_json::Value::Null,
        );
        assert_eq!(bus.subscriber_count(), 0);
    }
}
