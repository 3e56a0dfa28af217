use super::escape;
use super::layout::{PageContext, html_shell};
use crate::i18n::Locale;

fn message_page(
    ctx: &PageContext<'_>,
    title_key: &str,
    message_key: &str,
    link: Option<(&str, &str)>,
) -> String {
    let title = ctx.t(title_key);
    let link = link
        .map(|(href, key)| {
            format!(
                r#"<a class="button" href="{}">{}</a>"#,
                escape(href),
                escape(&ctx.t(key))
            )
        })
        .unwrap_or_default();
    let content = format!(
        r#"<section class="card status-card"><h1>{title}</h1><p>{message}</p>{link}</section>"#,
        title = escape(&title),
        message = escape(&ctx.t(message_key)),
    );
    html_shell(ctx, &title, &content)
}

#[must_use]
pub fn unauthorized_page(locale: Locale, path: &str) -> String {
    let ctx = PageContext::new(locale, path);
    let chat = format!("/{locale}/chat");
    message_page(
        &ctx,
        "Unauthorized.title",
        "Unauthorized.message",
        Some((&chat, "Unauthorized.back")),
    )
}

#[must_use]
pub fn not_found_page(locale: Locale) -> String {
    let path = format!("/{locale}");
    let ctx = PageContext::new(locale, &path);
    let login = format!("/{locale}/login");
    message_page(
        &ctx,
        "NotFound.title",
        "NotFound.message",
        Some((&login, "NotFound.back")),
    )
}

/// Generic failure page; `message_key` picks the explanation.
#[must_use]
pub fn error_page(locale: Locale, message_key: &str) -> String {
    let path = format!("/{locale}");
    let ctx = PageContext::new(locale, &path);
    message_page(&ctx, "Errors.title", message_key, None)
}
