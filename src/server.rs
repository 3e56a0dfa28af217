use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::AppState;
use crate::chat::{ChatBackend, HttpChatBackend};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::i18n::Locale;
use crate::identity::build_backends;
use crate::routes::{self, api, auth, chat, dashboard};
use crate::security::{rate_limit_middleware, require_admin, require_session};
use crate::ui;

/// How often expired sessions and idle rate-limit buckets are dropped.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let identity = build_backends(&config.identity)?;
    info!(
        name: "identity.backend.selected",
        provider = %config.identity.provider,
        "Identity backend ready"
    );

    let chat: Arc<dyn ChatBackend> = Arc::new(HttpChatBackend::new(&config.chat)?);
    info!(
        name: "chat.backend.configured",
        endpoint = %config.chat.endpoint,
        timeout_secs = config.chat.timeout_secs,
        "Chat backend configured"
    );

    let state = AppState::new(Arc::clone(&config), identity, chat)?;
    spawn_sweeper(state.clone());

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the full router: pages, JSON endpoints, static files and the
/// middleware stack.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    // Credential submissions are rate limited
    let credentials = Router::new()
        .route(
            "/{locale}/login",
            get(auth::login_form).post(auth::login_submit),
        )
        .route(
            "/{locale}/register",
            get(auth::register_form).post(auth::register_submit),
        )
        .route("/api/login", post(api::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let admin = Router::new()
        .route("/{locale}/dashboard", get(dashboard::dashboard))
        .route(
            "/{locale}/dashboard/users/{id}/position",
            post(dashboard::update_position),
        )
        .route_layer(middleware::from_fn(require_admin));

    // require_session wraps require_admin, so it runs first
    let signed_in = Router::new()
        .route("/{locale}/chat", get(chat::chat).post(chat::send_message))
        .route("/{locale}/chat/new", post(chat::new_chat))
        .route(
            "/{locale}/chat/conversations/{id}",
            post(chat::open_conversation),
        )
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let timeout = Duration::from_secs(config.resilience.request_timeout_secs);

    Router::new()
        .route("/", get(routes::root_redirect))
        .route("/health", get(api::health))
        .route("/{locale}", get(routes::locale_root))
        .route("/{locale}/logout", post(auth::logout))
        .route("/{locale}/unauthorized", get(auth::unauthorized))
        .merge(credentials)
        .merge(signed_in)
        .nest_service("/static", ServeDir::new(&config.server.static_dir))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.chat.max_upload_bytes))
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            timeout_middleware(timeout, req, next)
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn timeout_middleware(duration: Duration, req: Request, next: Next) -> Response {
    let locale = Locale::from_path(req.uri().path()).unwrap_or_default();
    match tokio::time::timeout(duration, next.run(req)).await {
        Ok(res) => res,
        Err(_) => (
            StatusCode::REQUEST_TIMEOUT,
            Html(ui::error_page(locale, "Errors.timeout")),
        )
            .into_response(),
    }
}

fn spawn_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            state.rate_limiter.retain_recent();
            let sessions = &state.sessions;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                debug!(
                    name: "session.sweep",
                    removed,
                    remaining = sessions.len(),
                    "Expired sessions removed"
                );
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(name: "server.signal.failed", error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(name: "server.shutdown", "Shutdown signal received");
}
