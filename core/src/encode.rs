//! Query-string, form and multipart encoders, plus the content-type switch
//! that picks one of them for a non-GET body.

use serde_json::Value;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::http::{content_type, essence, Body, Headers, CONTENT_TYPE};
use crate::params::{render, Params};

/// `application/x-www-form-urlencoded` serialization of `params`.
pub fn to_query_string(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, &render(value));
    }
    serializer.finish()
}

/// Text fields of a multipart body, in order.
///
/// Boundary selection is left to the transport, which is also the one that
/// sets the final `Content-Type` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrays expand into one field per element; `null` elements are
    /// skipped.
    pub fn from_params(params: &Params) -> Self {
        let mut form = FormData::new();
        for (key, value) in params {
            match value {
                Value::Array(items) => {
                    for item in items.iter().filter(|v| !v.is_null()) {
                        form.append(key.clone(), render(item));
                    }
                }
                other => form.append(key.clone(), render(other)),
            }
        }
        form
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A fresh boundary string, unique per request.
    pub fn boundary() -> String {
        format!("----HttpPipelineBoundary{}", Uuid::new_v4().simple())
    }

    pub fn content_type(boundary: &str) -> String {
        format!("{}; boundary={boundary}", content_type::MULTIPART)
    }

    /// Serialize as a `multipart/form-data` body delimited by `boundary`.
    pub fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut out = String::new();
        for (name, value) in &self.fields {
            out.push_str("--");
            out.push_str(boundary);
            out.push_str("\r\n");
            out.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                escape_name(name)
            ));
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("--");
        out.push_str(boundary);
        out.push_str("--\r\n");
        out.into_bytes()
    }
}

fn escape_name(name: &str) -> String {
    name.replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Encode a non-GET body according to the `Content-Type` in `headers`.
///
/// For multipart bodies the header is removed so the transport can set one
/// that carries its boundary.
pub fn encode_body(headers: &mut Headers, params: &Params) -> Result<Body, PipelineError> {
    let kind = headers.get(CONTENT_TYPE).map(essence);
    let body = match kind.as_deref() {
        Some(content_type::JSON) => Body::Json(serde_json::to_string(params)?),
        Some(content_type::MULTIPART) => {
            headers.remove(CONTENT_TYPE);
            Body::Multipart(FormData::from_params(params))
        }
        Some(content_type::FORM) => Body::UrlEncoded(to_query_string(params)),
        _ => Body::Raw(params.clone()),
    };
    Ok(body)
}
