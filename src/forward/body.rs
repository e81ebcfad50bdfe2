//! Inbound body interpretation.
//!
//! The content type decides how a POST/PUT body is read:
//!
//! ```text
//! multipart/form-data                → FormFields / FormFieldsWithFiles
//! application/json                   → JsonBody
//! application/x-www-form-urlencoded  → FormFields
//! anything else, or no content type  → RawBytes
//! ```
//!
//! Matching is a case-insensitive substring test, so parameters such as
//! `; charset=utf-8` or `; boundary=...` do not affect classification.

use std::convert::Infallible;
use std::fmt;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};
use futures_util::stream;
use indexmap::IndexMap;

use crate::forward::error::ForwardError;

/// Plain form fields in the order their names first appeared.
pub type FormFields = IndexMap<String, String>;

/// A file attached to a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The interpreted shape of an inbound body.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundBody {
    NoBody,
    FormFields(FormFields),
    FormFieldsWithFiles(FormFields, Vec<FilePart>),
    JsonBody(serde_json::Value),
    RawBytes(Bytes),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Multipart,
    Json,
    UrlEncoded,
    Raw,
}

impl BodyKind {
    fn classify(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return BodyKind::Raw;
        };
        let content_type = content_type.to_ascii_lowercase();

        if content_type.contains("multipart/form-data") {
            BodyKind::Multipart
        } else if content_type.contains("application/json") {
            BodyKind::Json
        } else if content_type.contains("application/x-www-form-urlencoded") {
            BodyKind::UrlEncoded
        } else {
            BodyKind::Raw
        }
    }
}

/// Classify and parse an inbound body.
///
/// Only POST and PUT bodies are interpreted; every other method yields
/// [`InboundBody::NoBody`]. An empty POST/PUT body is passed on as empty raw
/// bytes whatever its declared content type.
pub async fn interpret(
    method: &Method,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<InboundBody, ForwardError> {
    if *method != Method::POST && *method != Method::PUT {
        return Ok(InboundBody::NoBody);
    }
    if body.is_empty() {
        return Ok(InboundBody::RawBytes(body));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    match BodyKind::classify(content_type) {
        BodyKind::Multipart => parse_multipart(headers, body).await,
        BodyKind::Json => serde_json::from_slice(&body)
            .map(InboundBody::JsonBody)
            .map_err(|e| ForwardError::MalformedBody(format!("invalid JSON: {e}"))),
        BodyKind::UrlEncoded => Ok(InboundBody::FormFields(parse_urlencoded(&body))),
        BodyKind::Raw => Ok(InboundBody::RawBytes(body)),
    }
}

fn parse_urlencoded(body: &[u8]) -> FormFields {
    form_urlencoded::parse(body).into_owned().collect()
}

async fn parse_multipart(headers: &HeaderMap, body: Bytes) -> Result<InboundBody, ForwardError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| ForwardError::MalformedBody(e.to_string()))?;

    let chunks = stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(chunks, boundary);

    let mut fields = FormFields::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ForwardError::MalformedBody(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ForwardError::MalformedBody(e.to_string()))?;

        match file_name {
            Some(file_name) => files.push(FilePart {
                field_name,
                file_name,
                content_type,
                data,
            }),
            None => {
                let value = String::from_utf8(data.to_vec()).map_err(|_| {
                    ForwardError::MalformedBody(format!("field '{field_name}' is not valid UTF-8"))
                })?;
                fields.insert(field_name, value);
            }
        }
    }

    if files.is_empty() {
        Ok(InboundBody::FormFields(fields))
    } else {
        Ok(InboundBody::FormFieldsWithFiles(fields, files))
    }
}

/// Compact summary used in request logs. File and raw payloads are reported by size only.
impl fmt::Display for InboundBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundBody::NoBody => write!(f, "-"),
            InboundBody::FormFields(fields) => write!(f, "{:?}", fields),
            InboundBody::FormFieldsWithFiles(fields, files) => {
                write!(f, "{:?} files=[", fields)?;
                for (i, file) in files.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}={} ({} bytes)", file.field_name, file.file_name, file.data.len())?;
                }
                write!(f, "]")
            }
            InboundBody::JsonBody(value) => write!(f, "{}", value),
            InboundBody::RawBytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}
