//! Server-side browser sessions.
//!
//! A session is created at sign-in and referenced by a random id stored in an
//! HttpOnly cookie. It carries the signed-in identity, the chat transcript,
//! archived conversations and a one-shot flash message.
//!
//! - [`Session`]: one browser session
//! - [`SessionStore`]: thread-safe store with inactivity expiry
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use rag_portal::session::{Sender, SessionStore, SessionUser};
//! use rag_portal::users::Position;
//!
//! let store = SessionStore::new(Duration::from_secs(30 * 60));
//! let session = store.create(SessionUser {
//!     uid: "u1".into(),
//!     email: "ana@example.com".into(),
//!     name: "Ana".into(),
//!     position: Position::Employee,
//!     id_token: "id-token".into(),
//!     token_key: "role-token".into(),
//! });
//! session.add_message(Sender::User, "Hello!");
//!
//! assert_eq!(session.message_count(), 1);
//! ```

mod thread;

pub use thread::{
    ChatMessage, Conversation, Flash, FlashLevel, Sender, Session, SessionStore, SessionUser,
};
