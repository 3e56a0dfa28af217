//! User records kept in the external `Users` collection.
//!
//! - [`Position`]: role label and its access rules
//! - [`directory`]: dashboard search, filter and pagination

pub mod directory;
mod position;

pub use directory::{DirectoryParams, PAGE_SIZE, PositionFilter, UserPage, UserQuery, directory};
pub use position::{InvalidPosition, Position};

/// Name of the collection holding user documents.
pub const USERS_COLLECTION: &str = "Users";

/// Whether `id` can name a single document in [`USERS_COLLECTION`].
///
/// Auth user ids are opaque, but they never contain `/` and are never a
/// relative path segment.
#[must_use]
pub fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains('/')
}

/// A user document, keyed by the auth service's user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Auth user id; also the document id.
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: Position,
    /// Sealed role token (`tokenKey`) handed to the chat backend.
    pub token_key: String,
    pub terms_accepted: bool,
}
