//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, client IP logging)
//! - Buffer and interpret inbound bodies
//! - Hand requests to the Forwarder and relay its outcome
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::forward::{interpret, ForwardError, Forwarder, InboundRequest};
use crate::http::middleware::log_client_ip;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub max_body_bytes: usize,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState {
            forwarder: Forwarder::new(&config)?,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let handler = get(proxy_handler)
            .post(proxy_handler)
            .put(proxy_handler)
            .delete(proxy_handler);

        let mut router = Router::new()
            .route("/{*path}", handler.clone())
            .route("/", handler)
            .with_state(state);

        if config.proxy_version_2 {
            router = router.layer(middleware::from_fn(log_client_ip));
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// A clone of the router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            target = %self.config.target_base(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Buffers and interprets the body, then forwards the request upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let error = if e.into_inner().is::<LengthLimitError>() {
                ForwardError::BodyTooLarge { limit: state.max_body_bytes }
            } else {
                ForwardError::MalformedBody("request body could not be read".to_string())
            };
            tracing::warn!(method = %parts.method, uri = %parts.uri, error = %error, "Rejecting request");
            return error.into_response();
        }
    };

    let body = match interpret(&parts.method, &parts.headers, bytes).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!(method = %parts.method, uri = %parts.uri, error = %error, "Rejecting request");
            return error.into_response();
        }
    };

    tracing::info!(
        method = %parts.method,
        uri = %parts.uri,
        headers = ?parts.headers,
        body = %body,
        "Received request"
    );

    let request = InboundRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    };

    match state.forwarder.forward(request).await {
        Ok(upstream) => upstream.into_response(),
        Err(error) => error.into_response(),
    }
}
