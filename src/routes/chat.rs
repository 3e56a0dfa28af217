//! Chat page: send questions with files, start over, reopen archived threads.

use axum::{
    Extension,
    extract::{Multipart, Path, State},
    http::Uri,
    response::{Html, Redirect},
};
use tracing::{debug, info, warn};

use crate::AppState;
use crate::chat::{Attachment, ChatRequest, compose_user_message, partition, upstream_question};
use crate::error::AppError;
use crate::i18n::{Locale, t};
use crate::session::{Flash, Sender, Session};
use crate::ui::{ChatView, PageContext, chat_page};

/// A parsed chat form: the question text and every non-empty file part.
#[derive(Debug, Default)]
struct Submission {
    question: String,
    files: Vec<Attachment>,
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("question") => {
                submission.question = field.text().await?;
            }
            Some("file") => {
                let filename = field.file_name().map(str::to_string).unwrap_or_default();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send one empty part when no file was picked
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                submission.files.push(Attachment::new(
                    filename,
                    content_type.as_deref(),
                    bytes.to_vec(),
                ));
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// `GET /{locale}/chat`
pub async fn chat(
    locale: Locale,
    uri: Uri,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let user = session.user();
    let view = ChatView {
        messages: session.messages(),
        conversations: session.conversations(),
        active_conversation: session.active_conversation(),
        flash: session.take_flash(),
        show_dashboard_link: user.position.is_admin(),
    };
    let ctx = PageContext::new(locale, uri.path()).with_user(user);
    Html(chat_page(&ctx, &view))
}

/// `POST /{locale}/chat`
pub async fn send_message(
    locale: Locale,
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let back = Redirect::to(&format!("/{locale}/chat"));
    let submission = read_submission(multipart).await?;

    let (files, rejected) = partition(submission.files);
    if !rejected.is_empty() {
        debug!(name: "chat.files.rejected", files = ?rejected, "Dropped unsupported attachments");
        session.set_flash(Flash::error("Chat.invalidFileType"));
    }

    let question = submission.question.trim().to_string();
    if question.is_empty() && files.is_empty() {
        return Ok(back);
    }

    let filenames: Vec<String> = files.iter().map(|f| f.filename.clone()).collect();
    session.add_message(
        Sender::User,
        compose_user_message(&question, &filenames, &t(locale, "Chat.uploadedFiles")),
    );

    let request = ChatRequest {
        question: upstream_question(&question).to_string(),
        token: session.user().token_key.clone(),
        files,
    };

    match state.chat.ask(request).await {
        Ok(reply) => {
            info!(
                name: "chat.reply.received",
                uid = %session.user().uid,
                attachments = filenames.len(),
                empty = reply.output.is_none(),
                "Chat reply received"
            );
            let text = reply
                .output
                .unwrap_or_else(|| t(locale, "Chat.noResponse"));
            session.add_message(Sender::Assistant, text);
        }
        Err(e) => {
            warn!(name: "chat.reply.failed", uid = %session.user().uid, error = %e, "Chat backend call failed");
            session.set_flash(Flash::error("Chat.errorSendingMessage"));
        }
    }

    Ok(back)
}

/// `POST /{locale}/chat/new`
pub async fn new_chat(locale: Locale, Extension(session): Extension<Session>) -> Redirect {
    session.start_new_chat();
    Redirect::to(&format!("/{locale}/chat"))
}

/// `POST /{locale}/chat/conversations/{id}`
pub async fn open_conversation(
    locale: Locale,
    Extension(session): Extension<Session>,
    Path((_, id)): Path<(String, usize)>,
) -> Result<Redirect, AppError> {
    if !session.load_conversation(id) {
        return Err(AppError::NotFound);
    }
    Ok(Redirect::to(&format!("/{locale}/chat")))
}
