//! Originating client IP logging.
//! Active only when `proxy_version_2` is enabled; headers are left untouched.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// First entry of `X-Forwarded-For`, i.e. the address the request started from.
pub fn client_ip(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
}

pub async fn log_client_ip(req: Request<Body>, next: Next) -> Response {
    if let Some(ip) = client_ip(req.headers()) {
        tracing::info!(client_ip = %ip, "Client IP");
    }
    next.run(req).await
}
