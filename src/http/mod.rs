//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one task per request)
//!     → middleware/client_ip.rs (optional X-Forwarded-For logging)
//!     → proxy handler (buffer + interpret body)
//!     → forward::Forwarder (single upstream call)
//!     → upstream response, or 400 / 413 / 502
//! ```

pub mod middleware;
pub mod server;

pub use server::{AppState, HttpServer};
