//! Request guards
//!
//! Shared-secret checks for mutating endpoints and the webhook, and the
//! per-client rate limit on the public listings.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::error::{ApiError, ApiResult};
use crate::config::Config;
use crate::rate_limit::{RateDecision, RateLimiter, retry_after_secs};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Check a shared secret header
///
/// An unset secret disables the check.
pub fn require_secret(headers: &HeaderMap, header: &str, expected: Option<&str>) -> ApiResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = headers.get(header).and_then(|v| v.to_str().ok());
    if presented == Some(expected) {
        Ok(())
    } else {
        tracing::warn!("Rejected request with missing or wrong {}", header);
        Err(ApiError::Unauthorized)
    }
}

pub async fn require_api_key(
    State(config): State<Arc<Config>>,
    request: Request,
    next: Next,
) -> Response {
    match require_secret(
        request.headers(),
        API_KEY_HEADER,
        config.job_api_secret.as_deref(),
    ) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

pub async fn require_webhook_secret(
    State(config): State<Arc<Config>>,
    request: Request,
    next: Next,
) -> Response {
    match require_secret(
        request.headers(),
        WEBHOOK_SECRET_HEADER,
        config.webhook_secret.as_deref(),
    ) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

/// Identify the caller by proxy headers
///
/// First entry of `x-forwarded-for`, then `x-real-ip`, then `"unknown"`.
pub fn client_key(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .unwrap_or("unknown")
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(request.headers());

    match limiter.check(&key) {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        RateDecision::Limited { retry_after } => {
            tracing::warn!("Rate limit exceeded for {}", key);
            ApiError::TooManyRequests {
                retry_after_secs: retry_after_secs(retry_after),
            }
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_secret_unset_allows_everything() {
        assert!(require_secret(&HeaderMap::new(), API_KEY_HEADER, None).is_ok());
    }

    #[test]
    fn test_secret_must_match_exactly() {
        let expected = Some("s3cret");
        assert!(require_secret(&headers(&[("x-api-key", "s3cret")]), API_KEY_HEADER, expected).is_ok());
        assert!(matches!(
            require_secret(&headers(&[("x-api-key", "S3CRET")]), API_KEY_HEADER, expected),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            require_secret(&HeaderMap::new(), API_KEY_HEADER, expected),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_client_key_prefers_first_forwarded_address() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_key(&map), "203.0.113.7");
    }

    #[test]
    fn test_client_key_fallbacks() {
        assert_eq!(client_key(&headers(&[("x-real-ip", "10.0.0.2")])), "10.0.0.2");
        assert_eq!(client_key(&HeaderMap::new()), "unknown");
    }
}
