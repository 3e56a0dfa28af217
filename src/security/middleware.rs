use axum::{
    Extension,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use crate::AppState;
use crate::i18n::Locale;
use crate::session::Session;

/// Resolve the session cookie and inject the [`Session`] into request
/// extensions. Anonymous or expired visitors go to the login page.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let locale = Locale::from_path(request.uri().path()).unwrap_or_default();
    let jar = CookieJar::from_headers(request.headers());

    let session = jar
        .get(&state.config.session.cookie_name)
        .and_then(|cookie| state.sessions.get(cookie.value()));

    match session {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => {
            debug!(
                name: "auth.session.missing",
                path = %request.uri().path(),
                "No live session, redirecting to login"
            );
            Redirect::to(&format!("/{locale}/login")).into_response()
        }
    }
}

/// Only managers and main admins pass. Must run inside [`require_session`].
pub async fn require_admin(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    if session.user().position.is_admin() {
        return next.run(request).await;
    }

    let locale = Locale::from_path(request.uri().path()).unwrap_or_default();
    warn!(
        name: "auth.admin.denied",
        uid = %session.user().uid,
        path = %request.uri().path(),
        "Non-admin tried to open an admin page"
    );
    Redirect::to(&format!("/{locale}/unauthorized")).into_response()
}
