//! Server-rendered pages.
//!
//! Every page is a plain function returning an HTML string; handlers wrap it
//! in `axum::response::Html`. Forms post back to the server and follow the
//! post-redirect-get pattern, so the pages need no client-side script.
//!
//! All values that originate from users or external services go through
//! [`escape`] before they are interpolated.

mod auth;
mod chat;
mod dashboard;
pub mod forms;
mod layout;
mod status;

pub use auth::{LoginView, RegisterView, login_page, register_page};
pub use chat::{ChatView, chat_page};
pub use dashboard::{DashboardView, dashboard_page};
pub use layout::{PageContext, html_shell, html_shell_with_head};
pub use status::{error_page, not_found_page, unauthorized_page};

/// Escape text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
