use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use cocotas_shared::Profile;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::events::{EventBus, SessionEvent};

/// Preview label for a conversation that just moved.
const TIME_NOW_LABEL: &str = "Agora";
/// First message a fresh match greets the viewer with.
const INITIAL_PEER_MESSAGE: &str = "Oi! Vi que deu match!";
/// What the peer sends back after the viewer writes.
const CANNED_REPLY: &str = "Que legal! Estava esperando você mandar mensagem.";

pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1500);

// --- Ledger entries ---

/// A match that has not been written to yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatThread {
    pub thread_id: Uuid,
    pub name: String,
    pub image: String,
}

/// A thread with at least one message, shown in the conversation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub thread_id: Uuid,
    pub name: String,
    pub image: String,
    pub preview: String,
    pub time_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    Viewer,
    Peer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: MessageSender,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn now(sender: MessageSender, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}

#[derive(Default)]
struct LedgerState {
    new_matches: Vec<ChatThread>,
    conversations: Vec<Conversation>,
    messages: HashMap<Uuid, Vec<ChatMessage>>,
}

// --- ChatLedger ---

/// Session-scoped conversation state. Purely local; nothing here touches
/// the backend.
///
/// The first message on a fresh match moves the thread from the new-matches
/// set to the head of the conversation list exactly once. Later messages
/// update the existing conversation in place. Every viewer message arms a
/// one-shot timer that appends a canned peer reply and re-sorts the thread
/// to the head.
#[derive(Clone)]
pub struct ChatLedger {
    state: Arc<Mutex<LedgerState>>,
    reply_delay: Duration,
}

impl ChatLedger {
    pub fn new(reply_delay: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            reply_delay,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the ledger with the session's starting threads.
    pub fn seed(&self, new_matches: Vec<ChatThread>, conversations: Vec<Conversation>) {
        let mut state = self.lock();
        for thread in &new_matches {
            state
                .messages
                .entry(thread.thread_id)
                .or_insert_with(|| vec![ChatMessage::now(MessageSender::Peer, INITIAL_PEER_MESSAGE)]);
        }
        state.new_matches = new_matches;
        state.conversations = conversations;
    }

    /// Fold a discovered match into the new-matches set.
    pub fn on_match(&self, profile: &Profile, match_id: Uuid) {
        let mut state = self.lock();
        let already_known = state.new_matches.iter().any(|t| t.thread_id == match_id)
            || state.conversations.iter().any(|c| c.thread_id == match_id);
        if already_known {
            return;
        }
        state.new_matches.push(ChatThread {
            thread_id: match_id,
            name: profile.display_name().to_string(),
            image: profile.primary_image().to_string(),
        });
        state
            .messages
            .entry(match_id)
            .or_insert_with(|| vec![ChatMessage::now(MessageSender::Peer, INITIAL_PEER_MESSAGE)]);
    }

    /// Wire [`SessionEvent::MatchFound`] into the ledger. The returned task
    /// runs until the bus closes.
    pub fn attach(&self, bus: &EventBus) -> tokio::task::JoinHandle<()> {
        let ledger = self.clone();
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(SessionEvent::MatchFound { profile, match_id }) => {
                        ledger.on_match(&profile, match_id);
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "chat ledger lagged behind the bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Record a viewer message on `thread_id`.
    ///
    /// Unknown threads are ignored. Known threads get the message appended,
    /// the conversation promoted or updated, and a canned reply timer armed.
    pub fn record_message(&self, thread_id: Uuid, content: impl Into<String>) {
        let content = content.into();
        {
            let mut state = self.lock();

            if let Some(pos) = state.new_matches.iter().position(|t| t.thread_id == thread_id) {
                // First message: the thread moves to the head of the list,
                // exactly once.
                let thread = state.new_matches.remove(pos);
                state.conversations.insert(
                    0,
                    Conversation {
                        thread_id,
                        name: thread.name,
                        image: thread.image,
                        preview: content.clone(),
                        time_label: TIME_NOW_LABEL.to_string(),
                    },
                );
            } else if let Some(conversation) = state
                .conversations
                .iter_mut()
                .find(|c| c.thread_id == thread_id)
            {
                conversation.preview = content.clone();
                conversation.time_label = TIME_NOW_LABEL.to_string();
            } else {
                debug!(%thread_id, "message for unknown thread ignored");
                return;
            }

            state
                .messages
                .entry(thread_id)
                .or_default()
                .push(ChatMessage::now(MessageSender::Viewer, content));
        }

        self.arm_canned_reply(thread_id);
    }

    fn arm_canned_reply(&self, thread_id: Uuid) {
        let ledger = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ledger.reply_delay).await;
            let mut state = ledger.lock();
            state
                .messages
                .entry(thread_id)
                .or_default()
                .push(ChatMessage::now(MessageSender::Peer, CANNED_REPLY));
            if let Some(pos) = state
                .conversations
                .iter()
                .position(|c| c.thread_id == thread_id)
            {
                let mut conversation = state.conversations.remove(pos);
                conversation.preview = CANNED_REPLY.to_string();
                conversation.time_label = TIME_NOW_LABEL.to_string();
                state.conversations.insert(0, conversation);
            }
        });
    }

    // --- Read access ---

    pub fn new_matches(&self) -> Vec<ChatThread> {
        self.lock().new_matches.clone()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.lock().conversations.clone()
    }

    pub fn messages(&self, thread_id: Uuid) -> Vec<ChatMessage> {
        self.lock()
            .messages
            .get(&thread_id)
            .cloned()
            .unwrap_or_default()
    }
}
