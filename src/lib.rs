//! Single-target HTTP forwarding proxy library.
//!
//! Every inbound request is relayed to `http://localhost:<forwarding_port>`
//! with the same method, path, query and headers (minus `Host`), its body
//! re-encoded to match its content type, and the upstream reply returned
//! unchanged.

pub mod config;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use forward::Forwarder;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
