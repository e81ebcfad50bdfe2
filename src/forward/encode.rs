//! Re-encoding of an interpreted body for the outbound request.
//!
//! Every parsed shape is serialised again and paired with a matching
//! `Content-Type`, so the upstream never sees a body whose framing disagrees
//! with its declared type. Raw bodies keep whatever the caller sent.

use axum::body::Bytes;
use axum::http::HeaderValue;
use reqwest::multipart::{Form, Part};

use crate::forward::body::{FilePart, FormFields, InboundBody};
use crate::forward::error::ForwardError;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const APPLICATION_JSON: &str = "application/json";

/// Wire payload handed to the upstream client.
#[derive(Debug)]
pub enum Payload {
    Empty,
    Bytes(Bytes),
    /// Streamed by reqwest with the boundary of the contained form.
    Multipart(Form),
}

/// Re-encoded body plus the `Content-Type` that must replace the inbound one.
#[derive(Debug)]
pub struct EncodedBody {
    /// `None` leaves the inbound `Content-Type` untouched.
    pub content_type: Option<HeaderValue>,
    pub payload: Payload,
}

impl EncodedBody {
    fn unchanged(payload: Payload) -> Self {
        Self { content_type: None, payload }
    }

    /// Bytes of the payload, when it is already materialised.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Empty => Some(&[]),
            Payload::Bytes(bytes) => Some(bytes),
            Payload::Multipart(_) => None,
        }
    }
}

pub fn encode(body: InboundBody) -> Result<EncodedBody, ForwardError> {
    match body {
        InboundBody::NoBody => Ok(EncodedBody::unchanged(Payload::Empty)),
        InboundBody::RawBytes(bytes) => Ok(EncodedBody::unchanged(Payload::Bytes(bytes))),
        InboundBody::FormFields(fields) => Ok(EncodedBody {
            content_type: Some(HeaderValue::from_static(FORM_URLENCODED)),
            payload: Payload::Bytes(Bytes::from(encode_urlencoded(&fields))),
        }),
        InboundBody::JsonBody(value) => {
            let text = serde_json::to_vec(&value)
                .map_err(|e| ForwardError::MalformedBody(e.to_string()))?;
            Ok(EncodedBody {
                content_type: Some(HeaderValue::from_static(APPLICATION_JSON)),
                payload: Payload::Bytes(Bytes::from(text)),
            })
        }
        InboundBody::FormFieldsWithFiles(fields, files) => encode_multipart(fields, files),
    }
}

fn encode_urlencoded(fields: &FormFields) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .finish()
}

fn encode_multipart(fields: FormFields, files: Vec<FilePart>) -> Result<EncodedBody, ForwardError> {
    // Quoted names as received; multer and most servers ignore RFC 2231 `name*=`.
    let mut form = Form::new().percent_encode_noop();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for file in files {
        let mut part = Part::bytes(file.data.to_vec()).file_name(file.file_name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type).map_err(|e| {
                ForwardError::MalformedBody(format!("invalid part content type '{content_type}': {e}"))
            })?;
        }
        form = form.part(file.field_name, part);
    }

    let content_type = HeaderValue::from_str(&format!(
        "multipart/form-data; boundary={}",
        form.boundary()
    ))
    .map_err(|e| ForwardError::MalformedBody(e.to_string()))?;

    Ok(EncodedBody {
        content_type: Some(content_type),
        payload: Payload::Multipart(form),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_body_has_no_override() {
        let encoded = encode(InboundBody::NoBody).unwrap();
        assert!(encoded.content_type.is_none());
        assert_eq!(encoded.as_bytes(), Some(&[][..]));
    }

    #[test]
    fn raw_bytes_pass_through() {
        let encoded = encode(InboundBody::RawBytes(Bytes::from_static(b"\x00\x01raw"))).unwrap();
        assert!(encoded.content_type.is_none());
        assert_eq!(encoded.as_bytes(), Some(&b"\x00\x01raw"[..]));
    }

    #[test]
    fn form_fields_are_urlencoded_in_order() {
        let mut fields = FormFields::new();
        fields.insert("name".into(), "a b".into());
        fields.insert("sym".into(), "&=".into());

        let encoded = encode(InboundBody::FormFields(fields)).unwrap();
        assert_eq!(encoded.content_type.clone().unwrap(), FORM_URLENCODED);
        assert_eq!(encoded.as_bytes(), Some(&b"name=a+b&sym=%26%3D"[..]));
    }

    #[test]
    fn json_is_serialised_with_json_content_type() {
        let encoded = encode(InboundBody::JsonBody(json!({"name": "a"}))).unwrap();
        assert_eq!(encoded.content_type.clone().unwrap(), APPLICATION_JSON);
        assert_eq!(encoded.as_bytes(), Some(&br#"{"name":"a"}"#[..]));
    }

    #[test]
    fn json_numbers_keep_their_exact_text() {
        let text = r#"{"id":123456789012345678901234567890,"ratio":0.1000000000000000055511151231257827}"#;
        let value: serde_json::Value = serde_json::from_str(text).unwrap();

        let encoded = encode(InboundBody::JsonBody(value)).unwrap();
        assert_eq!(encoded.as_bytes(), Some(text.as_bytes()));
    }

    #[test]
    fn multipart_gets_boundary_in_content_type() {
        let mut fields = FormFields::new();
        fields.insert("caption".into(), "hi".into());
        let files = vec![FilePart {
            field_name: "photo".into(),
            file_name: "a.png".into(),
            content_type: Some("image/png".into()),
            data: Bytes::from_static(b"png"),
        }];

        let encoded = encode(InboundBody::FormFieldsWithFiles(fields, files)).unwrap();
        let Payload::Multipart(form) = &encoded.payload else {
            panic!("expected multipart payload");
        };
        let expected = format!("multipart/form-data; boundary={}", form.boundary());
        assert_eq!(encoded.content_type.as_ref().unwrap(), expected.as_str());
        assert!(encoded.as_bytes().is_none());
    }

    #[test]
    fn each_multipart_encoding_gets_a_fresh_boundary() {
        let make = || {
            InboundBody::FormFieldsWithFiles(
                FormFields::new(),
                vec![FilePart {
                    field_name: "file".into(),
                    file_name: "a.png".into(),
                    content_type: None,
                    data: Bytes::from_static(b"x"),
                }],
            )
        };
        let first = encode(make()).unwrap().content_type.unwrap();
        let second = encode(make()).unwrap().content_type.unwrap();
        assert_ne!(first, second);
    }
}
