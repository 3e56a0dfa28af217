//! Search, position filtering and pagination over the user list.

use serde::Deserialize;

use super::{Position, UserRecord};

/// Rows per dashboard page.
pub const PAGE_SIZE: usize = 10;

/// Position filter applied to the listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionFilter {
    #[default]
    All,
    Only(Position),
}

impl PositionFilter {
    /// Parse a query value. Empty, `all` and `Todos` select every position;
    /// unrecognized values fall back to `All`.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("" | "all" | "Todos") => Self::All,
            Some(v) => v.parse().map_or(Self::All, Self::Only),
        }
    }

    /// Value used in query strings and `<select>` options.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(p) => p.slug(),
        }
    }

    #[must_use]
    pub fn matches(self, position: Position) -> bool {
        match self {
            Self::All => true,
            Self::Only(p) => p == position,
        }
    }
}

/// Raw dashboard query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
}

/// Normalized dashboard query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub search: String,
    pub position: PositionFilter,
    pub page: usize,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            position: PositionFilter::All,
            page: 1,
        }
    }
}

impl From<DirectoryParams> for UserQuery {
    fn from(params: DirectoryParams) -> Self {
        Self {
            search: params.search.unwrap_or_default().trim().to_string(),
            position: PositionFilter::parse(params.position.as_deref()),
            page: params.page.unwrap_or(1).max(1),
        }
    }
}

impl UserQuery {
    /// Query string for this query at another page.
    #[must_use]
    pub fn to_query_string(&self, page: usize) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            serializer.append_pair("search", &self.search);
        }
        serializer.append_pair("position", self.position.slug());
        serializer.append_pair("page", &page.to_string());
        serializer.finish()
    }
}

/// One page of the filtered listing.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<UserRecord>,
    pub page: usize,
    /// Number of users matching the query across all pages.
    pub total: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Sort by name, filter and slice out the requested page.
#[must_use]
pub fn directory(mut users: Vec<UserRecord>, query: &UserQuery) -> UserPage {
    users.sort_by_cached_key(|u| u.name.to_lowercase());

    let needle = query.search.to_lowercase();
    let matching: Vec<UserRecord> = users
        .into_iter()
        .filter(|u| {
            needle.is_empty()
                || u.name.to_lowercase().contains(&needle)
                || u.email.to_lowercase().contains(&needle)
        })
        .filter(|u| query.position.matches(u.position))
        .collect();

    let page = query.page.max(1);
    let total = matching.len();
    let users = matching
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    UserPage {
        users,
        page,
        total,
        has_previous: page > 1,
        has_next: page * PAGE_SIZE < total,
    }
}
