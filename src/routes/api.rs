//! JSON endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::session_cookie;
use crate::AppState;

/// Cookie carrying the ID token issued by `/api/login`.
pub const AUTH_TOKEN_COOKIE: &str = "authToken";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `POST /api/login`
///
/// Exchanges credentials for an HttpOnly `authToken` cookie holding the
/// ID token.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Response {
    match state.accounts.sign_in(body.email.trim(), &body.password).await {
        Ok(auth) => {
            info!(name: "api.login.succeeded", uid = %auth.uid, "Token issued");
            let jar = jar.add(session_cookie(AUTH_TOKEN_COOKIE, auth.id_token));
            (jar, Json(json!({ "success": true }))).into_response()
        }
        Err(e) => {
            warn!(name: "api.login.failed", error = %e, "Token request rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response()
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
