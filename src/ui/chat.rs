//! Chat page: transcript, composer with file picker, previous conversations.

use std::fmt::Write as _;

use super::escape;
use super::layout::{PageContext, html_shell};
use crate::session::{ChatMessage, Conversation, Flash, Sender};

#[derive(Debug, Clone, Default)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub conversations: Vec<Conversation>,
    pub active_conversation: Option<usize>,
    pub flash: Option<Flash>,
    /// Show the link back to the admin panel.
    pub show_dashboard_link: bool,
}

/// Escape and keep line breaks.
fn multiline(text: &str) -> String {
    escape(text).replace('\n', "<br>")
}

fn transcript(ctx: &PageContext<'_>, messages: &[ChatMessage]) -> String {
    let mut html = String::new();
    for message in messages {
        let (class, who) = match message.sender {
            Sender::User => ("message user", ctx.t("Chat.user")),
            Sender::Assistant => ("message assistant", ctx.t("Chat.assistant")),
        };
        let _ = write!(
            html,
            r#"<article class="{class}"><header>{who}</header><p>{text}</p></article>"#,
            who = escape(&who),
            text = multiline(&message.text),
        );
    }
    html
}

fn conversation_list(ctx: &PageContext<'_>, view: &ChatView) -> String {
    if view.conversations.is_empty() {
        return format!(
            r#"<p class="empty">{}</p>"#,
            escape(&ctx.t("Chat.noConversations"))
        );
    }
    let mut html = String::from("<ul>");
    for conversation in &view.conversations {
        let active = if view.active_conversation == Some(conversation.id) {
            r#" class="active""#
        } else {
            ""
        };
        let _ = write!(
            html,
            r#"<li{active}><form method="post" action="/{locale}/chat/conversations/{id}"><button type="submit" class="link-button">{title}</button></form></li>"#,
            locale = ctx.locale,
            id = conversation.id,
            title = escape(&conversation.title),
        );
    }
    html.push_str("</ul>");
    html
}

#[must_use]
pub fn chat_page(ctx: &PageContext<'_>, view: &ChatView) -> String {
    let locale = ctx.locale;
    let title = ctx.t("Chat.title");

    let error = view
        .flash
        .as_ref()
        .map(|flash| {
            format!(
                r#"<div class="alert alert-error" role="alert">{}</div>"#,
                escape(&ctx.t(&flash.key))
            )
        })
        .unwrap_or_default();

    let dashboard_link = if view.show_dashboard_link {
        format!(
            r#"<a class="button" href="/{locale}/dashboard">{}</a>"#,
            escape(&ctx.t("Chat.dashboard"))
        )
    } else {
        String::new()
    };

    let content = format!(
        r#"<section class="chat">
    <aside class="conversations">
        <form method="post" action="/{locale}/chat/new">
            <button type="submit" class="primary">{new_chat}</button>
        </form>
        <h2>{previous}</h2>
        {conversations}
        {dashboard_link}
    </aside>
    <div class="chat-main">
        <div class="transcript" id="transcript">{transcript}</div>
        {error}
        <form method="post" action="/{locale}/chat" enctype="multipart/form-data" class="composer">
            <textarea name="question" rows="2" placeholder="{placeholder}"></textarea>
            <label class="file-picker">
                <span>{upload}</span>
                <input type="file" name="file" multiple accept=".pdf,.docx,.txt,.md,.rtf">
            </label>
            <button type="submit" class="primary" aria-label="{send}">{send}</button>
        </form>
    </div>
</section>"#,
        new_chat = escape(&ctx.t("Chat.newChat")),
        previous = escape(&ctx.t("Chat.openConversations")),
        conversations = conversation_list(ctx, view),
        transcript = transcript(ctx, &view.messages),
        placeholder = escape(&ctx.t("Chat.writeQuestion")),
        upload = escape(&ctx.t("Chat.uploadFile")),
        send = escape(&ctx.t("Chat.sendMessage")),
    );

    html_shell(ctx, &title, &content)
}
