//! Admin dashboard: user listing and position changes.

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::Uri,
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::AppState;
use crate::error::AppError;
use crate::i18n::Locale;
use crate::session::{Flash, Session};
use crate::ui::{DashboardView, PageContext, dashboard_page};
use crate::users::{
    DirectoryParams, InvalidPosition, Position, UserPage, UserQuery, directory,
    is_valid_user_id,
};

/// Body of the per-row position form.
#[derive(Debug, Deserialize)]
pub struct PositionForm {
    /// Missing when an unassigned user's row is saved unchanged.
    #[serde(default)]
    pub position: String,
    /// Query string of the listing the form was posted from.
    #[serde(default)]
    pub return_to: String,
}

/// `GET /{locale}/dashboard`
pub async fn dashboard(
    locale: Locale,
    uri: Uri,
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<DirectoryParams>,
) -> Html<String> {
    let query = UserQuery::from(params);
    let user = session.user();
    let mut flash = session.take_flash();

    let page = match state.documents.list_users(&user.id_token).await {
        Ok(users) => directory(users, &query),
        Err(e) => {
            warn!(name: "dashboard.list.failed", error = %e, "Could not list users");
            flash = Some(Flash::error("Dashboard.loadError"));
            UserPage {
                users: Vec::new(),
                page: query.page,
                total: 0,
                has_previous: false,
                has_next: false,
            }
        }
    };

    let ctx = PageContext::new(locale, uri.path()).with_user(user);
    Html(dashboard_page(&ctx, &DashboardView { query, page, flash }))
}

/// `POST /{locale}/dashboard/users/{id}/position`
pub async fn update_position(
    locale: Locale,
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((_, uid)): Path<(String, String)>,
    Form(form): Form<PositionForm>,
) -> Result<Redirect, AppError> {
    if !is_valid_user_id(&uid) {
        return Err(AppError::BadRequest(format!("invalid user id: {uid:?}")));
    }
    let position: Position = form
        .position
        .parse()
        .map_err(|e: InvalidPosition| AppError::BadRequest(e.to_string()))?;

    let token_key = state.cipher.seal_position(position)?;
    let user = session.user();

    match state
        .documents
        .update_position(&user.id_token, &uid, position, &token_key)
        .await
    {
        Ok(()) => {
            info!(
                name: "dashboard.position.updated",
                admin = %user.uid,
                target = %uid,
                position = %position,
                "Position changed"
            );
            session.set_flash(Flash::notice("Dashboard.positionUpdated"));
        }
        Err(e) => {
            warn!(
                name: "dashboard.position.failed",
                target = %uid,
                error = %e,
                "Position update rejected"
            );
            session.set_flash(Flash::error("Dashboard.updateError"));
        }
    }

    Ok(Redirect::to(&return_location(locale, &form.return_to)))
}

/// Rebuild the listing URL from the posted query string so only known
/// parameters reach the `Location` header.
fn return_location(locale: Locale, return_to: &str) -> String {
    let mut params = DirectoryParams::default();
    for (key, value) in url::form_urlencoded::parse(return_to.trim_start_matches('?').as_bytes()) {
        match key.as_ref() {
            "search" => params.search = Some(value.into_owned()),
            "position" => params.position = Some(value.into_owned()),
            "page" => params.page = value.parse().ok(),
            _ => {}
        }
    }
    let query = UserQuery::from(params);
    format!("/{locale}/dashboard?{}", query.to_query_string(query.page))
}
