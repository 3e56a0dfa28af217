//! Browser sessions and their chat threads.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::users::Position;

/// Characters of the first message used as an archived conversation's title.
const TITLE_CHARS: usize = 30;

/// The signed-in account bound to a session.
#[derive(Clone)]
pub struct SessionUser {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub position: Position,
    /// Bearer token for the document store.
    pub id_token: String,
    /// Sealed role token forwarded to the chat backend.
    pub token_key: String,
}

impl std::fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// A transcript archived by "new chat".
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: usize,
    pub title: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Error,
    Notice,
}

/// One-shot message shown on the next page render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    /// Catalog key of the message.
    pub key: String,
}

impl Flash {
    pub fn error(key: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            key: key.into(),
        }
    }

    pub fn notice(key: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Notice,
            key: key.into(),
        }
    }
}

/// A single browser session.
///
/// Cloning is cheap; clones share state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    id: String,
    user: SessionUser,
    messages: RwLock<Vec<ChatMessage>>,
    /// Newest first.
    conversations: RwLock<Vec<Conversation>>,
    active_conversation: RwLock<Option<usize>>,
    flash: RwLock<Option<Flash>>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Session {
    fn new(id: String, user: SessionUser) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                user,
                messages: RwLock::new(Vec::new()),
                conversations: RwLock::new(Vec::new()),
                active_conversation: RwLock::new(None),
                flash: RwLock::new(None),
                last_activity: RwLock::new(Utc::now()),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    #[must_use]
    pub fn user(&self) -> &SessionUser {
        &self.inner.user
    }

    /// Append a message to the current transcript.
    pub fn add_message(&self, sender: Sender, text: impl Into<String>) {
        self.inner
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ChatMessage {
                sender,
                text: text.into(),
            });
        self.touch();
    }

    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.inner
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Archive a non-empty transcript and start over.
    ///
    /// The archived conversation is titled with the first 30 characters of
    /// its first message and placed at the front of the list.
    pub fn start_new_chat(&self) {
        let messages = std::mem::take(
            &mut *self
                .inner
                .messages
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );

        if let Some(first) = messages.first() {
            let title: String = first.text.chars().take(TITLE_CHARS).collect();
            let mut conversations = self
                .inner
                .conversations
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let conversation = Conversation {
                id: conversations.len(),
                title,
                messages,
            };
            conversations.insert(0, conversation);
        }

        *self
            .inner
            .active_conversation
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.touch();
    }

    /// Replace the transcript with an archived conversation.
    ///
    /// Returns `false` when no conversation has that id.
    pub fn load_conversation(&self, id: usize) -> bool {
        let found = self
            .inner
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.messages.clone());

        let Some(messages) = found else {
            return false;
        };

        *self
            .inner
            .messages
            .write()
            .unwrap_or_else(PoisonError::into_inner) = messages;
        *self
            .inner
            .active_conversation
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(id);
        self.touch();
        true
    }

    #[must_use]
    pub fn conversations(&self) -> Vec<Conversation> {
        self.inner
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn active_conversation(&self) -> Option<usize> {
        *self
            .inner
            .active_conversation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_flash(&self, flash: Flash) {
        *self
            .inner
            .flash
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(flash);
    }

    /// Take the pending flash, leaving none behind.
    pub fn take_flash(&self) -> Option<Flash> {
        self.inner
            .flash
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn touch(&self) {
        *self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Utc::now();
    }

    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        // A negative span means clock skew; treat it as fresh
        (Utc::now() - last)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Thread-safe store for sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
    timeout: Duration,
}

impl SessionStore {
    /// Create a store whose sessions expire after `timeout` of inactivity.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                timeout,
            }),
        }
    }

    /// Start a session for a freshly signed-in user.
    #[must_use]
    pub fn create(&self, user: SessionUser) -> Session {
        let session = Session::new(Uuid::new_v4().to_string(), user);
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id().to_string(), session.clone());
        session
    }

    /// Look up a live session. Expired sessions are dropped and not returned.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        let session = self
            .inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;

        if session.is_expired_with_timeout(self.inner.timeout) {
            self.remove(id);
            return None;
        }
        session.touch();
        Some(session)
    }

    pub fn remove(&self, id: &str) -> Option<Session> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove expired sessions using the store's timeout.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_with_timeout(self.inner.timeout)
    }

    /// Remove sessions that have been inactive longer than the timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self
            .inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }
}
