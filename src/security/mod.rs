//! Request guards: session and role checks, credential rate limiting.

pub mod middleware;
pub mod rate_limit;

pub use middleware::{require_admin, require_session};
pub use rate_limit::{CredentialRateLimiter, rate_limit_middleware};
