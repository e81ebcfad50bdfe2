//! Forwarding of one inbound request to the fixed upstream.
//!
//! # Request States
//! ```text
//! Pending → Forwarded  (any upstream response, whatever its status)
//! Pending → Failed     (transport error or timeout → 502)
//! ```
//!
//! Exactly one outbound call is made per inbound request; nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::ProxyConfig;
use crate::forward::body::InboundBody;
use crate::forward::encode::{encode, EncodedBody, Payload};
use crate::forward::error::ForwardError;
use crate::forward::headers::outbound_headers;

/// A decoded inbound request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    /// Path as received, starting with `/`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: InboundBody,
}

/// The request that will be sent upstream.
#[derive(Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: EncodedBody,
}

/// Upstream reply, relayed to the caller untouched.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Sends requests to `http://localhost:<forwarding_port>`.
///
/// Cheap to clone; the client and target are shared read-only.
#[derive(Clone)]
pub struct Forwarder {
    target_base: Arc<str>,
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            target_base: Arc::from(config.target_base()),
            client,
        })
    }

    pub fn target_base(&self) -> &str {
        &self.target_base
    }

    /// Target base joined with the inbound path and query, both verbatim.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = String::with_capacity(self.target_base.len() + path.len() + 16);
        url.push_str(&self.target_base);
        if !path.starts_with('/') {
            url.push('/');
        }
        url.push_str(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Derive the outbound request without sending it.
    pub fn prepare(&self, request: InboundRequest) -> Result<OutboundRequest, ForwardError> {
        let url = self.target_url(&request.path, request.query.as_deref());
        let body = encode(request.body)?;
        let headers = outbound_headers(&request.headers, &body);

        Ok(OutboundRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }

    /// Forward the request and collect the upstream reply.
    pub async fn forward(&self, request: InboundRequest) -> Result<UpstreamResponse, ForwardError> {
        let outbound = self.prepare(request)?;
        self.send(outbound).await
    }

    pub async fn send(&self, outbound: OutboundRequest) -> Result<UpstreamResponse, ForwardError> {
        let OutboundRequest { method, url, mut headers, body } = outbound;

        tracing::debug!(method = %method, url = %url, "Forwarding upstream");

        let builder = self.client.request(method.clone(), &url);
        let builder = match body.payload {
            Payload::Empty => builder.headers(headers),
            Payload::Bytes(bytes) => builder.headers(headers).body(bytes),
            Payload::Multipart(form) => {
                // reqwest writes the boundary header for the form itself.
                headers.remove(header::CONTENT_TYPE);
                builder.headers(headers).multipart(form)
            }
        };

        let response = builder.send().await.map_err(|e| upstream_failure(&method, &url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| upstream_failure(&method, &url, e))?;

        tracing::debug!(
            method = %method,
            url = %url,
            status = %status,
            bytes = body.len(),
            "Upstream responded"
        );

        Ok(UpstreamResponse { status, headers, body })
    }
}

fn upstream_failure(method: &Method, url: &str, error: reqwest::Error) -> ForwardError {
    tracing::error!(
        method = %method,
        url = %url,
        timed_out = error.is_timeout(),
        error = %error,
        "Upstream request failed"
    );
    ForwardError::UpstreamUnreachable(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn forwarder(port: u16) -> Forwarder {
        let mut config = ProxyConfig::default();
        config.forwarding_port = port;
        config.timeouts.connect_secs = 1;
        config.timeouts.request_secs = 2;
        Forwarder::new(&config).unwrap()
    }

    fn request(method: Method, path: &str, query: Option<&str>, body: InboundBody) -> InboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:5000"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        InboundRequest {
            method,
            path: path.to_string(),
            query: query.map(str::to_string),
            headers,
            body,
        }
    }

    #[test]
    fn target_url_keeps_path_and_query_verbatim() {
        let forwarder = forwarder(9000);
        assert_eq!(forwarder.target_base(), "http://localhost:9000");
        assert_eq!(forwarder.target_url("/", None), "http://localhost:9000/");
        assert_eq!(
            forwarder.target_url("/items", Some("x=1")),
            "http://localhost:9000/items?x=1"
        );
        assert_eq!(
            forwarder.target_url("/a%20b/c", Some("q=%2F&q=2")),
            "http://localhost:9000/a%20b/c?q=%2F&q=2"
        );
        assert_eq!(forwarder.target_url("/items", Some("")), "http://localhost:9000/items");
        assert_eq!(forwarder.target_url("raw", None), "http://localhost:9000/raw");
    }

    #[test]
    fn prepare_json_post() {
        let forwarder = forwarder(9000);
        let outbound = forwarder
            .prepare(request(Method::POST, "/items", Some("x=1"), InboundBody::JsonBody(json!({"name": "a"}))))
            .unwrap();

        assert_eq!(outbound.method, Method::POST);
        assert_eq!(outbound.url, "http://localhost:9000/items?x=1");
        assert_eq!(outbound.headers[header::CONTENT_TYPE], "application/json");
        assert!(outbound.headers.get(header::HOST).is_none());
        assert_eq!(outbound.body.as_bytes(), Some(&br#"{"name":"a"}"#[..]));
    }

    #[test]
    fn prepare_get_sends_no_body_and_keeps_content_type() {
        let forwarder = forwarder(9000);
        let outbound = forwarder
            .prepare(request(Method::GET, "/items", None, InboundBody::NoBody))
            .unwrap();

        assert_eq!(outbound.body.as_bytes(), Some(&[][..]));
        assert!(outbound.body.content_type.is_none());
        assert_eq!(outbound.headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn prepare_is_deterministic() {
        let forwarder = forwarder(9000);
        let make = || request(Method::PUT, "/x", Some("a=b"), InboundBody::JsonBody(json!({"k": [1, 2]})));

        let first = forwarder.prepare(make()).unwrap();
        let second = forwarder.prepare(make()).unwrap();
        assert_eq!(first.url, second.url);
        assert_eq!(first.method, second.method);
        assert_eq!(first.body.as_bytes(), second.body.as_bytes());
    }

    #[tokio::test]
    async fn unreachable_upstream_is_reported() {
        // Grab a free port, then release it so nothing is listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let forwarder = forwarder(port);

        let err = forwarder
            .forward(request(Method::GET, "/", None, InboundBody::NoBody))
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::UpstreamUnreachable(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn upstream_response_is_relayed_unchanged() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        let upstream = UpstreamResponse {
            status: StatusCode::CREATED,
            headers,
            body: Bytes::from_static(b"done"),
        };

        let response = upstream.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
    }
}
