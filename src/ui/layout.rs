use std::fmt::Write as _;

use super::escape;
use crate::i18n::{Locale, switch_locale_path, t};
use crate::session::SessionUser;

/// What every page needs besides its own content.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub locale: Locale,
    /// Request path, used to build language switcher links.
    pub path: &'a str,
    pub user: Option<&'a SessionUser>,
}

impl<'a> PageContext<'a> {
    #[must_use]
    pub fn new(locale: Locale, path: &'a str) -> Self {
        Self {
            locale,
            path,
            user: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: &'a SessionUser) -> Self {
        self.user = Some(user);
        self
    }

    pub(crate) fn t(&self, key: &str) -> String {
        t(self.locale, key)
    }
}

fn language_switcher(ctx: &PageContext<'_>) -> String {
    let mut links = String::new();
    for locale in Locale::ALL {
        let current = if locale == ctx.locale {
            r#" aria-current="true" class="active""#
        } else {
            ""
        };
        let _ = write!(
            links,
            r#"<a href="{href}" hreflang="{code}"{current}>{name}</a>"#,
            href = escape(&switch_locale_path(ctx.path, locale)),
            code = locale.code(),
            name = escape(&t(ctx.locale, locale.name_key())),
        );
    }
    format!(
        r#"<nav class="lang-switcher" aria-label="{label}">{links}</nav>"#,
        label = escape(&ctx.t("LanguageSwitcher.toggleLanguageMenu")),
    )
}

fn user_badge(ctx: &PageContext<'_>) -> String {
    let Some(user) = ctx.user else {
        return String::new();
    };
    format!(
        r#"<div class="user-badge">
            <span class="user-email">{email}</span>
            <span class="user-position">{position}</span>
            <form method="post" action="/{locale}/logout">
                <button type="submit" class="link-button">{logout}</button>
            </form>
        </div>"#,
        email = escape(&user.email),
        position = escape(user.position.as_stored()),
        locale = ctx.locale,
        logout = escape(&ctx.t("Chat.logout")),
    )
}

/// Generate the HTML shell for a page.
#[must_use]
pub fn html_shell(ctx: &PageContext<'_>, title: &str, content: &str) -> String {
    html_shell_with_head(ctx, title, "", content)
}

/// Like [`html_shell`], with extra markup appended to `<head>`.
///
/// `head` is inserted verbatim.
#[must_use]
pub fn html_shell_with_head(
    ctx: &PageContext<'_>,
    title: &str,
    head: &str,
    content: &str,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - {app}</title>
    <link rel="stylesheet" href="/static/app.css">
    {head}
</head>
<body>
    <header class="topbar">
        <span class="brand">{app}</span>
        <div class="topbar-actions">
            {badge}
            {switcher}
        </div>
    </header>
    <main id="app">
        {content}
    </main>
</body>
</html>"#,
        lang = ctx.locale.code(),
        title = escape(title),
        app = escape(&ctx.t("App.name")),
        badge = user_badge(ctx),
        switcher = language_switcher(ctx),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::Position;

    #[test]
    fn shell_links_every_locale() {
        let ctx = PageContext::new(Locale::Pt, "/pt/login");
        let html = html_shell(&ctx, "Entrar", "<p>x</p>");
        assert!(html.contains(r#"<html lang="pt">"#));
        assert!(html.contains(r#"href="/en/login""#));
        assert!(html.contains(r#"href="/es/login""#));
        assert!(html.contains("<p>x</p>"));
    }

    #[test]
    fn extra_head_markup_stays_in_head() {
        let ctx = PageContext::new(Locale::En, "/en/register");
        let html = html_shell_with_head(&ctx, "Register", r#"<meta name="x">"#, "<p>body</p>");
        let head_end = html.find("</head>").expect("head");
        let meta = html.find(r#"<meta name="x">"#).expect("meta");
        assert!(meta < head_end);
        assert!(html.find("<p>body</p>").expect("body") > head_end);
    }

    #[test]
    fn shell_shows_signed_in_user() {
        let user = SessionUser {
            uid: "u".into(),
            email: "<ana>@corp.io".into(),
            name: "Ana".into(),
            position: Position::Manager,
            id_token: String::new(),
            token_key: String::new(),
        };
        let ctx = PageContext::new(Locale::En, "/en/chat").with_user(&user);
        let html = html_shell(&ctx, "Chat", "");
        assert!(html.contains("&lt;ana&gt;@corp.io"));
        assert!(html.contains("Gestor"));
        assert!(html.contains(r#"action="/en/logout""#));
    }
}
