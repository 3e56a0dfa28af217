//! User positions (roles) as stored in the `Users` collection.

use std::fmt;
use std::str::FromStr;

/// Role label stored on each user document.
///
/// The stored strings are shared with the chat backend and existing data, so
/// they are kept verbatim (`"Funcionário"`, `"Gestor"`, `"Main-admin"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Position {
    /// Regular staff member; chat access only.
    Employee,
    /// Manager; dashboard access.
    Manager,
    /// Main administrator; dashboard access.
    MainAdmin,
    /// Missing or unrecognized position.
    #[default]
    Unassigned,
}

impl Position {
    /// Positions an administrator can assign, in menu order.
    pub const ASSIGNABLE: [Self; 3] = [Self::Employee, Self::Manager, Self::MainAdmin];

    /// Parse a stored value; unknown values become [`Position::Unassigned`].
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        value.parse().unwrap_or(Self::Unassigned)
    }

    /// Value written to the document store.
    #[must_use]
    pub fn as_stored(self) -> &'static str {
        match self {
            Self::Employee => "Funcionário",
            Self::Manager => "Gestor",
            Self::MainAdmin => "Main-admin",
            Self::Unassigned => "user",
        }
    }

    /// Stable identifier used in URLs and form values.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::MainAdmin => "main-admin",
            Self::Unassigned => "unassigned",
        }
    }

    /// i18n key of the human readable label.
    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Employee => "Positions.employee",
            Self::Manager => "Positions.manager",
            Self::MainAdmin => "Positions.mainAdmin",
            Self::Unassigned => "Positions.unassigned",
        }
    }

    /// Whether this position may open the admin dashboard.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Manager | Self::MainAdmin)
    }

    /// Plaintext sealed into the user's role token.
    #[must_use]
    pub fn token_plaintext(self) -> Option<&'static str> {
        match self {
            Self::Employee => Some("funcionario"),
            Self::Manager => Some("Gestor"),
            Self::MainAdmin => Some("Main-admin"),
            Self::Unassigned => None,
        }
    }

    /// Inverse of [`Position::token_plaintext`].
    #[must_use]
    pub fn from_token_plaintext(plaintext: &str) -> Self {
        Self::ASSIGNABLE
            .into_iter()
            .find(|p| p.token_plaintext() == Some(plaintext))
            .unwrap_or(Self::Unassigned)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored())
    }
}

/// Error for values that are not a known position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid position: {0}")]
pub struct InvalidPosition(pub String);

impl FromStr for Position {
    type Err = InvalidPosition;

    /// Accepts both stored labels and slugs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Funcionário" | "Funcionario" | "employee" => Ok(Self::Employee),
            "Gestor" | "manager" => Ok(Self::Manager),
            "Main-admin" | "main-admin" => Ok(Self::MainAdmin),
            other => Err(InvalidPosition(other.to_string())),
        }
    }
}
