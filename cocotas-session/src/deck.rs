use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cocotas_shared::data::tables;
use cocotas_shared::{
    canonical_pair, DataAccess, Direction, ErrorCode, MatchRow, NewSwipeDecision, Predicate,
    Profile,
};
use tracing::warn;

use crate::context::SessionContext;
use crate::events::{EventBus, SessionEvent};

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Where the deck is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckPhase {
    /// Nothing left to show.
    Empty,
    /// A profile is at the front, waiting for a decision.
    Ready,
    /// At least one decision round-trip is still in flight.
    Deciding,
}

/// The ordered queue of candidate profiles plus a bounded undo history.
///
/// `decide` pops the front optimistically and records the swipe on the
/// backend from a spawned task; the local state never waits on the network
/// and is never rolled back when the network fails.
pub struct SwipeDeck<D> {
    ctx: SessionContext<D>,
    queue: VecDeque<Profile>,
    // Most recent decision first.
    history: VecDeque<Profile>,
    history_capacity: usize,
    in_flight: Arc<AtomicUsize>,
}

impl<D: DataAccess> SwipeDeck<D> {
    pub fn new(ctx: SessionContext<D>) -> Self {
        Self::with_history_capacity(ctx, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(ctx: SessionContext<D>, history_capacity: usize) -> Self {
        Self {
            ctx,
            queue: VecDeque::new(),
            history: VecDeque::new(),
            history_capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the queue with a fresh catalog delivery. History survives a
    /// reload.
    pub fn load(&mut self, profiles: Vec<Profile>) {
        self.queue = profiles.into();
    }

    pub fn phase(&self) -> DeckPhase {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            DeckPhase::Deciding
        } else if self.queue.is_empty() {
            DeckPhase::Empty
        } else {
            DeckPhase::Ready
        }
    }

    /// The profile currently facing the viewer.
    pub fn current(&self) -> Option<&Profile> {
        self.queue.front()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Decide on the front profile. No-op on an empty queue.
    ///
    /// The profile is popped and pushed onto the undo history immediately;
    /// the backend round-trip runs on its own task and multiple round-trips
    /// may race. An insert failure emits [`SessionEvent::DecisionFailed`]
    /// and leaves the local state alone. A successful right swipe checks for
    /// the mutual match row and emits [`SessionEvent::MatchFound`] when it
    /// exists.
    pub fn decide(&mut self, direction: Direction) -> Option<Profile> {
        let profile = self.queue.pop_front()?;
        self.history.push_front(profile.clone());
        self.history.truncate(self.history_capacity);

        let decision = NewSwipeDecision {
            swiper_id: self.ctx.viewer_id,
            swiped_id: profile.id,
            direction,
        };
        let data = Arc::clone(&self.ctx.data);
        let bus = self.ctx.bus.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let swiped = profile.clone();

        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            record_decision(data, bus, decision, swiped).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        Some(profile)
    }

    /// Move the most recent history entry back to the front of the queue.
    /// No-op on an empty history. The recorded swipe is not deleted.
    pub fn undo(&mut self) -> Option<&Profile> {
        let profile = self.history.pop_front()?;
        self.queue.push_front(profile);
        self.queue.front()
    }
}

async fn record_decision<D: DataAccess>(
    data: Arc<D>,
    bus: EventBus,
    decision: NewSwipeDecision,
    swiped: Profile,
) {
    let row = match serde_json::to_value(&decision) {
        Ok(row) => row,
        Err(e) => {
            warn!(error = %e, "swipe payload failed to serialize");
            bus.emit(SessionEvent::DecisionFailed {
                decision,
                reason: e.to_string(),
            });
            return;
        }
    };

    if let Err(e) = data.insert(tables::SWIPES, row).await {
        warn!(error = %e, swiped_id = %decision.swiped_id, "swipe not recorded");
        bus.emit(SessionEvent::DecisionFailed {
            decision,
            reason: e.to_string(),
        });
        return;
    }

    if decision.direction != Direction::Right {
        return;
    }

    let (user_1, user_2) = canonical_pair(decision.swiper_id, decision.swiped_id);
    let predicate = Predicate::new().eq("user_1", user_1).eq("user_2", user_2);
    match data.query_one(tables::MATCHES, &predicate).await {
        Ok(row) => match serde_json::from_value::<MatchRow>(row) {
            Ok(m) => {
                bus.emit(SessionEvent::MatchFound {
                    profile: swiped,
                    match_id: m.id,
                });
            }
            Err(e) => warn!(error = %e, "match row failed to decode"),
        },
        // No mutual swipe yet; nothing to announce.
        Err(e) if e.code() == ErrorCode::RowNotFound => {}
        Err(e) => warn!(error = %e, "match lookup failed"),
    }
}
