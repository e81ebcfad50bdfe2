//! Request/response forwarding pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → body.rs (classify by content type → InboundBody)
//!     → encode.rs (re-serialise → EncodedBody + Content-Type override)
//!     → headers.rs (drop Host, apply override)
//!     → dispatcher.rs (one upstream call)
//!     → UpstreamResponse relayed as-is, or ForwardError → 4xx / 502
//! ```

pub mod body;
pub mod dispatcher;
pub mod encode;
pub mod error;
pub mod headers;

pub use body::{interpret, FilePart, FormFields, InboundBody};
pub use dispatcher::{Forwarder, InboundRequest, OutboundRequest, UpstreamResponse};
pub use encode::{encode, EncodedBody, Payload};
pub use error::{ForwardError, UPSTREAM_FAILURE_MESSAGE};
pub use headers::outbound_headers;
