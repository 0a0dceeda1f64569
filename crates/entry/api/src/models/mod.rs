//! API-layer state and error types.

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::{DefaultKeyedRateLimiter, Quota};
use pulseiq_identifiers::{CorrelationId, TenantId};
use pulseiq_runtime::{AppContext, ShardPool};

/// Shared state for every route.
#[derive(Clone)]
pub struct ApiState {
    pub ctx: Arc<AppContext>,
    pub pool: Arc<ShardPool>,
    pub tenant_limiter: Arc<DefaultKeyedRateLimiter<TenantId>>,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState").finish_non_exhaustive()
    }
}

impl ApiState {
    pub fn new(ctx: Arc<AppContext>, pool: Arc<ShardPool>) -> Self {
        let per_second = NonZeroU32::new(ctx.config().tenant_rate_limit.max(1))
            .unwrap_or(NonZeroU32::MIN);
        let burst = per_second.saturating_mul(NonZeroU32::new(2).unwrap_or(NonZeroU32::MIN));
        let quota = Quota::per_second(per_second).allow_burst(burst);
        Self {
            ctx,
            pool,
            tenant_limiter: Arc::new(DefaultKeyedRateLimiter::keyed(quota)),
        }
    }
}

/// Error envelope returned to API clients. Internal detail stays in the
/// logs, keyed by the correlation id.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    correlation_id: CorrelationId,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            correlation_id: CorrelationId::generate(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn rate_limited() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "tenant rate limit exceeded")
    }

    pub fn payload_too_large() -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "batch exceeds 256 KiB")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.correlation_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.message,
            "correlation_id": self.correlation_id,
        }));
        (self.status, body).into_response()
    }
}
