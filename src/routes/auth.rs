//! Login, registration and logout.

use axum::{
    Form,
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, warn};

use super::{landing_path, login_error_key, register_error_key, session_cookie};
use crate::AppState;
use crate::error::AppError;
use crate::i18n::Locale;
use crate::session::SessionUser;
use crate::ui::forms::{LoginForm, RegisterForm};
use crate::ui::{LoginView, RegisterView, login_page, register_page, unauthorized_page};
use crate::users::{Position, UserRecord};

/// `GET /{locale}/login`
pub async fn login_form(
    locale: Locale,
    uri: Uri,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Response {
    // Already signed in: skip the form
    let live = jar
        .get(&state.config.session.cookie_name)
        .and_then(|c| state.sessions.get(c.value()));
    if let Some(session) = live {
        return Redirect::to(&landing_path(locale, session.user().position)).into_response();
    }

    Html(login_page(locale, uri.path(), &LoginView::default())).into_response()
}

/// `POST /{locale}/login`
pub async fn login_submit(
    locale: Locale,
    uri: Uri,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_string();
    let rerender = |status: StatusCode, view: LoginView| {
        (status, Html(login_page(locale, uri.path(), &view))).into_response()
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return rerender(
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginView {
                email,
                errors,
                error: None,
            },
        );
    }

    let failed = |key: &str| LoginView {
        email: email.clone(),
        errors: Default::default(),
        error: Some(key.to_string()),
    };

    let auth = match state.accounts.sign_in(&email, &form.password).await {
        Ok(auth) => auth,
        Err(e) => {
            warn!(name: "auth.login.failed", error = %e, "Sign-in rejected");
            return rerender(StatusCode::UNAUTHORIZED, failed(login_error_key(&e)));
        }
    };

    let record = match state.documents.get_user(&auth.id_token, &auth.uid).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!(name: "auth.login.no_document", uid = %auth.uid, "Signed in without a user document");
            return rerender(StatusCode::FORBIDDEN, failed("Login.userDataNotFound"));
        }
        Err(e) => {
            warn!(name: "auth.login.document_failed", uid = %auth.uid, error = %e, "Could not load user document");
            return rerender(StatusCode::BAD_GATEWAY, failed("Login.genericError"));
        }
    };

    match state.cipher.open_position(&record.token_key) {
        Ok(sealed) if sealed == record.position => {}
        Ok(sealed) => warn!(
            name: "auth.token.mismatch",
            uid = %record.id,
            stored = %record.position,
            sealed = %sealed,
            "Role token does not match stored position"
        ),
        Err(e) => warn!(
            name: "auth.token.unreadable",
            uid = %record.id,
            error = %e,
            "Role token could not be opened"
        ),
    }

    let position = record.position;
    let session = state.sessions.create(SessionUser {
        uid: auth.uid,
        email: if record.email.is_empty() {
            auth.email
        } else {
            record.email
        },
        name: record.name,
        position,
        id_token: auth.id_token,
        token_key: record.token_key,
    });

    info!(
        name: "auth.login.succeeded",
        uid = %session.user().uid,
        position = %position,
        "User signed in"
    );

    let jar = jar.add(session_cookie(
        &state.config.session.cookie_name,
        session.id().to_string(),
    ));
    (jar, Redirect::to(&landing_path(locale, position))).into_response()
}

/// `GET /{locale}/register`
pub async fn register_form(locale: Locale, uri: Uri) -> Html<String> {
    Html(register_page(locale, uri.path(), &RegisterView::default()))
}

/// `POST /{locale}/register`
pub async fn register_submit(
    locale: Locale,
    uri: Uri,
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let render = |status: StatusCode, view: RegisterView| {
        (status, Html(register_page(locale, uri.path(), &view))).into_response()
    };
    let failed = |key: &str| RegisterView {
        name: form.name.clone(),
        email: form.email.clone(),
        errors: Default::default(),
        error: Some(key.to_string()),
        success: false,
    };

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(render(
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterView {
                name: form.name.clone(),
                email: form.email.clone(),
                errors,
                error: None,
                success: false,
            },
        ));
    }

    let name = form.name.trim().to_string();
    let auth = match state.accounts.sign_up(&form.email, &form.password).await {
        Ok(auth) => auth,
        Err(e) => {
            warn!(name: "auth.register.failed", error = %e, "Sign-up rejected");
            return Ok(render(StatusCode::BAD_REQUEST, failed(register_error_key(&e))));
        }
    };

    if let Err(e) = state.accounts.update_display_name(&auth.id_token, &name).await {
        warn!(name: "auth.register.profile_failed", uid = %auth.uid, error = %e, "Display name not set");
        return Ok(render(StatusCode::BAD_GATEWAY, failed(register_error_key(&e))));
    }

    let token_key = state.cipher.seal_position(Position::Employee)?;
    let record = UserRecord {
        id: auth.uid.clone(),
        name,
        email: form.email.clone(),
        position: Position::Employee,
        token_key,
        terms_accepted: true,
    };

    if let Err(e) = state.documents.set_user(&auth.id_token, &record).await {
        warn!(name: "auth.register.document_failed", uid = %auth.uid, error = %e, "User document not stored");
        return Ok(render(StatusCode::BAD_GATEWAY, failed(register_error_key(&e))));
    }

    info!(name: "auth.register.succeeded", uid = %auth.uid, "Account created");
    Ok(render(
        StatusCode::OK,
        RegisterView {
            success: true,
            ..RegisterView::default()
        },
    ))
}

/// `POST /{locale}/logout`
pub async fn logout(locale: Locale, State(state): State<AppState>, jar: CookieJar) -> Response {
    let cookie_name = state.config.session.cookie_name.clone();
    if let Some(session) = jar
        .get(&cookie_name)
        .and_then(|c| state.sessions.remove(c.value()))
    {
        info!(name: "auth.logout", uid = %session.user().uid, "User signed out");
    }
    let jar = jar.remove(Cookie::build(cookie_name).path("/"));
    (jar, Redirect::to(&format!("/{locale}/login"))).into_response()
}

/// `GET /{locale}/unauthorized`
pub async fn unauthorized(locale: Locale, uri: Uri) -> (StatusCode, Html<String>) {
    (
        StatusCode::FORBIDDEN,
        Html(unauthorized_page(locale, uri.path())),
    )
}
