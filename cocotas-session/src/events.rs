// Session event bus.
//
// Components publish meaningful session-level outcomes here: a mutual match
// discovered after a right swipe, or a swipe the backend refused to record.
// A single `EventBus` backed by a `tokio::sync::broadcast` channel fans each
// event out to every consumer (chat ledger, UI layer, logs).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use cocotas_shared::{NewSwipeDecision, Profile};

/// A session-level outcome worth reacting to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A right swipe completed and the mutual match row exists.
    MatchFound { profile: Profile, match_id: Uuid },

    /// The backend refused to record a swipe. The deck is not rolled back;
    /// this is the hook for reconciliation.
    DecisionFailed {
        decision: NewSwipeDecision,
        reason: String,
    },
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MatchFound { .. } => "match_found",
            Self::DecisionFailed { .. } => "decision_failed",
        }
    }
}

/// Broadcast-based fan-out channel for `SessionEvent`.
///
/// Capacity is generous (4096 events); subscribers that lag more than that
/// will skip events (same semantic as `broadcast::RecvError::Lagged`).
///
/// The bus is cheap to clone (interior `Arc`).
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4096);
        Self { tx }
    }

    pub fn with_capacity(cap: usize) -> Self {
        let (tx, _) = broadcast::channel(cap);
        Self { tx }
    }

    /// Publish an event. Returns the number of active subscribers that will
    /// receive it. Silently succeeds even if there are no subscribers.
    pub fn emit(&self, event: SessionEvent) -> usize {
        debug!(kind = event.kind(), "session event emitted");
        // broadcast::send returns Err only if there are 0 receivers, which is
        // normal before anything has attached to the session.
        self.tx.send(event).unwrap_or(0)
    }

    /// Obtain a new receiver. Each receiver gets an independent copy of every
    /// event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cocotas_shared::Direction;
    use serde_json::json;

    fn sample_decision() -> NewSwipeDecision {
        NewSwipeDecision {
            swiper_id: Uuid::new_v4(),
            swiped_id: Uuid::new_v4(),
            direction: Direction::Right,
        }
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let bus = EventBus::new();
        let n = bus.emit(SessionEvent::DecisionFailed {
            decision: sample_decision(),
            reason: "offline".into(),
        });
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn bus_fanout() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let profile: Profile =
            serde_json::from_value(json!({ "id": Uuid::new_v4() })).unwrap();
        let n = bus.emit(SessionEvent::MatchFound {
            profile,
            match_id: Uuid::new_v4(),
        });
        assert_eq!(n, 2);

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert_eq!(e1.kind(), "match_found");
        assert_eq!(e2.kind(), "match_found");
    }

    #[test]
    fn event_envelope_json() {
        let event = SessionEvent::DecisionFailed {
            decision: sample_decision(),
            reason: "insert refused".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"decision_failed\""));
        assert!(json.contains("insert refused"));
    }
}
