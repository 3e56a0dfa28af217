use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::AppState;
use crate::i18n::Locale;
use crate::ui;

/// Peers without connection info share this bucket.
const UNKNOWN_PEER: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// One token bucket per client address.
pub struct CredentialRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    quota: Quota,
}

impl CredentialRateLimiter {
    /// Zero rates are raised to one.
    #[must_use]
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate).allow_burst(burst);
        Self {
            limiter: RateLimiter::keyed(quota),
            quota,
        }
    }

    /// Take one token from `client`'s bucket if available.
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Forget clients whose buckets are full again.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl fmt::Debug for CredentialRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRateLimiter")
            .field("quota", &self.quota)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(UNKNOWN_PEER, |ConnectInfo(addr)| addr.ip())
}

/// Limit credential submissions per client. Only `POST`s consume tokens.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::POST && state.config.resilience.rate_limit_enabled {
        let client = client_ip(&req);
        if !state.rate_limiter.check(client) {
            let locale = Locale::from_path(req.uri().path()).unwrap_or_default();
            warn!(
                name: "security.rate_limited",
                client = %client,
                path = %req.uri().path(),
                "Credential submission rate limited"
            );
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Html(ui::error_page(locale, "Errors.tooManyRequests")),
            )
                .into_response();
        }
    }
    next.run(req).await
}
