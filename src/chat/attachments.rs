//! Which uploads may be forwarded, and how they show up in the transcript.

use std::path::Path;

/// Content types accepted as attachments.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/rtf",
    "text/rtf",
    "text/plain",
];

/// Extensions accepted regardless of the declared content type.
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt", "md", "rtf"];

/// Question sent upstream when a message carries only files.
pub const FILE_ONLY_QUESTION: &str = "File upload";

/// A file uploaded with a chat message.
#[derive(Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl Attachment {
    /// Build an attachment, guessing the content type from the name when the
    /// browser did not send one.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = match content_type {
            Some(ct) if !ct.is_empty() => ct.to_string(),
            _ => mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string(),
        };
        Self {
            filename,
            content_type,
            bytes,
        }
    }
}

/// Whether a file may be forwarded: allowed content type or allowed extension.
#[must_use]
pub fn is_allowed(filename: &str, content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return true;
    }
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Split uploads into accepted attachments and the names of rejected ones.
#[must_use]
pub fn partition(files: Vec<Attachment>) -> (Vec<Attachment>, Vec<String>) {
    let (accepted, rejected): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|f| is_allowed(&f.filename, &f.content_type));
    (accepted, rejected.into_iter().map(|f| f.filename).collect())
}

/// Transcript text for a user message.
///
/// With files, `label` followed by the comma separated names is appended on a
/// new line, or stands alone when there is no question.
#[must_use]
pub fn compose_user_message(question: &str, filenames: &[String], label: &str) -> String {
    let question = question.trim();
    if filenames.is_empty() {
        return question.to_string();
    }
    let files = format!("{label}{}", filenames.join(", "));
    if question.is_empty() {
        files
    } else {
        format!("{question}\n{files}")
    }
}

/// Question forwarded to the backend.
#[must_use]
pub fn upstream_question(question: &str) -> &str {
    if question.trim().is_empty() {
        FILE_ONLY_QUESTION
    } else {
        question
    }
}
