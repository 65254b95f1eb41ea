//! Application events and the broadcast bus that carries them.
//!
//! Pipelines emit an [`AppEvent`] after each committed state change. Views
//! and telemetry subscribe independently; an event with no subscribers is
//! dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{LanguageCode, PhotoSource};

/// What caused a language commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageSource {
    Manual,
    Geolocation,
    Restore,
}

/// How an analysis submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Applied,
    Failed,
    Superseded,
}

/// Domain event payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    SessionStarted {
        name: String,
    },
    SessionEnded,
    LanguageChanged {
        language: LanguageCode,
        source: LanguageSource,
    },
    PhotoCaptured {
        source: PhotoSource,
        timestamp: DateTime<Utc>,
        history_len: usize,
    },
    AnalysisSettled {
        submission: u64,
        outcome: AnalysisOutcome,
    },
}

impl AppEvent {
    /// Dot-namespaced event type, e.g. `"photo.captured"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            AppEvent::SessionStarted { .. } => "session.started",
            AppEvent::SessionEnded => "session.ended",
            AppEvent::LanguageChanged { .. } => "language.changed",
            AppEvent::PhotoCaptured { .. } => "photo.captured",
            AppEvent::AnalysisSettled { .. } => "analysis.settled",
        }
    }
}

/// Envelope around an [`AppEvent`].
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    /// UUIDv7, so ids sort by emission time.
    pub event_id: Uuid,
    pub event_type: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub payload: AppEvent,
}

impl EventEnvelope {
    pub fn new(payload: AppEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: payload.event_type(),
            occurred_at: Utc::now(),
            payload,
        }
    }
}

/// Broadcast bus for [`EventEnvelope`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let envelope = EventEnvelope::new(event);
        tracing::debug!(
            event_type = envelope.event_type,
            event_id = %envelope.event_id,
            subscriber_count = self.tx.receiver_count(),
            "EventBus emit"
        );
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to receive events. Each subscriber gets its own stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::defaults::EVENT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_without_subscribers_is_dropped() {
        let bus = EventBus::new(8);
        bus.emit(AppEvent::SessionEnded);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_envelope() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit(AppEvent::LanguageChanged {
            language: LanguageCode::Ta,
            source: LanguageSource::Manual,
        });

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event_type, "language.changed");
        assert_eq!(
            envelope.payload,
            AppEvent::LanguageChanged {
                language: LanguageCode::Ta,
                source: LanguageSource::Manual,
            }
        );
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = EventEnvelope::new(AppEvent::AnalysisSettled {
            submission: 3,
            outcome: AnalysisOutcome::Superseded,
        });
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["event_type"], "analysis.settled");
        assert_eq!(json["payload"]["type"], "analysis_settled");
        assert_eq!(json["payload"]["submission"], 3);
        assert_eq!(json["payload"]["outcome"], "superseded");
    }
}
