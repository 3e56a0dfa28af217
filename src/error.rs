use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::{error, warn};

use crate::chat::ChatError;
use crate::crypto::CryptoError;
use crate::i18n::Locale;
use crate::identity::IdentityError;
use crate::ui;

/// Errors surfaced by request handlers.
///
/// Details are logged; the browser only sees a localized error page.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unreadable or oversized multipart body.
    #[error("multipart body rejected: {0}")]
    Multipart(#[from] MultipartError),

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(e) => e.status(),
            Self::Identity(_) | Self::Chat(_) => StatusCode::BAD_GATEWAY,
            Self::Crypto(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let locale = Locale::default();

        let body = match &self {
            Self::NotFound => ui::not_found_page(locale),
            Self::BadRequest(reason) => {
                warn!(name: "request.rejected", reason = %reason, "Bad request");
                ui::error_page(locale, "Errors.generic")
            }
            Self::Multipart(e) => {
                warn!(
                    name: "request.multipart.rejected",
                    status = status.as_u16(),
                    error = %e,
                    "Multipart body rejected"
                );
                if status == StatusCode::PAYLOAD_TOO_LARGE {
                    ui::error_page(locale, "Errors.payloadTooLarge")
                } else {
                    ui::error_page(locale, "Errors.generic")
                }
            }
            other => {
                error!(
                    name: "request.failed",
                    status = status.as_u16(),
                    error = %other,
                    "Request failed"
                );
                ui::error_page(locale, "Errors.generic")
            }
        };

        (status, Html(body)).into_response()
    }
}
