//! Observability subsystem.
//!
//! Every request produces one `info` event with method, URI, headers and a
//! body summary; upstream failures and rejected bodies are logged at
//! `error` / `warn`. `tower_http::trace` adds per-request spans.

pub mod logging;
