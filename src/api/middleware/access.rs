use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::net::SocketAddr;
use std::sync::Arc;
use crate::error::AppError;
use crate::api::AppState;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Axum extractor that runs the access gate on the request origin.
/// Add this as a handler parameter to restrict the handler to the allowlist.
pub struct AllowedCaller;

impl FromRequestParts<Arc<AppState>> for AllowedCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let forwarded_for = forwarded_for(&parts.headers);
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_default();

        tracing::info!(
            x_forwarded_for = %forwarded_for,
            remote_addr = %remote_addr,
            "Checking request origin"
        );

        if state.gate.is_request_allowed(&forwarded_for, &remote_addr) {
            Ok(AllowedCaller)
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// All `X-Forwarded-For` values, joined in arrival order.
fn forwarded_for(headers: &HeaderMap) -> String {
    headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_joins_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("8.8.8.8"));
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1 10.0.0.2"));
        assert_eq!(forwarded_for(&headers), "8.8.8.8,10.0.0.1 10.0.0.2");
    }

    #[test]
    fn test_forwarded_for_missing_is_empty() {
        assert_eq!(forwarded_for(&HeaderMap::new()), "");
    }
}
