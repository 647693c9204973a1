//! Event types and broadcast bus
//!
//! Progress and lifecycle notifications for the import/analysis
//! pipeline. Consumers (UI layers, the CLI progress printer) subscribe
//! through [`EventBus`]; emission is lossy — a missing subscriber never
//! blocks or fails the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Pipeline events, serializable for transmission to a UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SoundcheckEvent {
    /// A new item entered the registry
    ItemImported {
        item_id: Uuid,
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// An add() call silently dropped duplicates (aggregate notice)
    DuplicatesFiltered {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Duration probe completed (duration is `None` on probe failure)
    DurationProbed {
        item_id: Uuid,
        duration: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// A batch run began
    BatchStarted {
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// Emitted strictly before the item's decode/analysis begins
    ItemAnalysisStarted {
        item_id: Uuid,
        name: String,
        /// 1-based position within the current run
        index: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    ItemAnalysisCompleted {
        item_id: Uuid,
        average_db: f64,
        max_db: f64,
        timestamp: DateTime<Utc>,
    },

    /// Per-item failure; the batch continues with the next item
    ItemAnalysisFailed {
        item_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },

    BatchCompleted {
        analyzed: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },

    ItemRemoved {
        item_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    RegistryCleared {
        count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus connecting the pipeline to its observers
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SoundcheckEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SoundcheckEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring whether anyone is listening
    pub fn emit_lossy(&self, event: SoundcheckEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribe_and_emit() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit_lossy(SoundcheckEvent::BatchStarted {
            total: 3,
            timestamp: Utc::now(),
        });

        match rx.recv().await.unwrap() {
            SoundcheckEvent::BatchStarted { total, .. } => assert_eq!(total, 3),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_lossy() {
        let bus = EventBus::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        // Must not panic or error
        bus.emit_lossy(SoundcheckEvent::RegistryCleared {
            count: 0,
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = SoundcheckEvent::DuplicatesFiltered {
            count: 2,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "DuplicatesFiltered");
        assert_eq!(json["count"], 2);
    }
}
