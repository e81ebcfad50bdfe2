//! Outbound header derivation.
//!
//! # Rules
//! - `Host` is dropped; the client sets it from the target URL
//! - Every other header is copied verbatim, multi-values included
//! - A re-encoded body's `Content-Type` replaces the inbound one
//! - `Content-Length` / `Transfer-Encoding` are recomputed by the client for
//!   the body actually sent

use axum::http::{header, HeaderMap};

use crate::forward::encode::EncodedBody;

/// Headers the transport derives from the outbound body itself.
const FRAMING_HEADERS: [header::HeaderName; 2] = [header::CONTENT_LENGTH, header::TRANSFER_ENCODING];

pub fn outbound_headers(inbound: &HeaderMap, body: &EncodedBody) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());

    for (name, value) in inbound {
        if *name == header::HOST || FRAMING_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(content_type) = &body.content_type {
        headers.insert(header::CONTENT_TYPE, content_type.clone());
    }

    headers
}
