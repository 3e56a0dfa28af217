//! Request handlers, one module per page family.

pub mod api;
pub mod auth;
pub mod chat;
pub mod dashboard;

use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::i18n::Locale;
use crate::identity::{AuthErrorCode, IdentityError};
use crate::users::Position;

/// `GET /`
pub async fn root_redirect() -> Redirect {
    Redirect::to(&format!("/{}/login", Locale::default()))
}

/// `GET /{locale}`
pub async fn locale_root(locale: Locale) -> Redirect {
    Redirect::to(&format!("/{locale}/login"))
}

/// Landing page after sign-in.
#[must_use]
pub fn landing_path(locale: Locale, position: Position) -> String {
    if position.is_admin() {
        format!("/{locale}/dashboard")
    } else {
        format!("/{locale}/chat")
    }
}

/// Session cookie: HttpOnly, `SameSite=Strict`, whole site.
#[must_use]
pub fn session_cookie(name: &str, value: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build()
}

/// Catalog key shown for a failed sign-in.
#[must_use]
pub fn login_error_key(error: &IdentityError) -> &'static str {
    match error.code() {
        Some(AuthErrorCode::WrongPassword | AuthErrorCode::InvalidCredentials) => {
            "Login.wrongPassword"
        }
        Some(AuthErrorCode::UserNotFound) => "Login.userNotFound",
        Some(AuthErrorCode::InvalidEmail) => "Login.invalidEmail",
        Some(AuthErrorCode::TooManyRequests) => "Login.tooManyRequests",
        _ => "Login.genericError",
    }
}

/// Catalog key shown for a failed registration.
#[must_use]
pub fn register_error_key(error: &IdentityError) -> &'static str {
    match error.code() {
        Some(AuthErrorCode::EmailAlreadyInUse) => "Register.errors.emailAlreadyInUse",
        Some(AuthErrorCode::InvalidEmail) => "Register.errors.emailInvalid",
        Some(AuthErrorCode::WeakPassword) => "Register.errors.weakPassword",
        Some(AuthErrorCode::OperationNotAllowed) => "Register.errors.operationNotAllowed",
        _ => "Register.errors.defaultError",
    }
}
