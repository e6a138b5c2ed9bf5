//! HTTP types shared by the pipeline, the hooks and the transports.
//!
//! # Design
//! Requests and responses are plain data. The pipeline builds an
//! `HttpRequest`, hands it to `before` and then to a `Transport`, and gets an
//! `HttpResponse` back. Nothing here performs I/O, so transports can be
//! swapped (or stubbed in tests) without touching the pipeline.

use std::fmt;

use bytes::Bytes;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::encode::FormData;
use crate::error::PipelineError;
use crate::hooks::ProgressHook;
use crate::params::Params;

/// Content types the pipeline knows how to encode a body for.
pub mod content_type {
    pub const JSON: &str = "application/json";
    pub const FORM: &str = "application/x-www-form-urlencoded";
    pub const MULTIPART: &str = "multipart/form-data";
}

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the `after` hook should decode the raw response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResType {
    #[default]
    Json,
    Text,
    Blob,
    ArrayBuffer,
}

/// Ordered header list with case-insensitive names.
///
/// Inserting a name that already exists (in any casing) replaces the old
/// entry in place, so the first spelling wins and the last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(idx).1)
    }

    /// Overlay `other` on top of `self`; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Headers) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeadersVisitor;

        impl<'de> Visitor<'de> for HeadersVisitor {
            type Value = Headers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of header names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Headers, A::Error> {
                let mut headers = Headers::new();
                while let Some((k, v)) = map.next_entry::<String, String>()? {
                    headers.insert(k, v);
                }
                Ok(headers)
            }
        }

        deserializer.deserialize_map(HeadersVisitor)
    }
}

/// Request body as produced by the encoding step.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// GET requests, or a body that was never set.
    Empty,
    Json(String),
    UrlEncoded(String),
    /// Field list; the transport picks the boundary and sets the header.
    Multipart(FormData),
    /// Content type was not one the pipeline encodes; the map is handed to
    /// the transport untouched.
    Raw(Params),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Body::Json(s) | Body::UrlEncoded(s) => Some(s),
            _ => None,
        }
    }
}

/// Upload/download progress as reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// A fully encoded request, as seen by `before` and by the transport.
///
/// `on_progress` and `res_type` are filled in after `before` returns.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Params,
    pub headers: Headers,
    pub body: Body,
    pub res_type: ResType,
    pub on_progress: Option<ProgressHook>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Params::new(),
            headers: Headers::new(),
            body: Body::Empty,
            res_type: ResType::default(),
            on_progress: None,
        }
    }

    /// Forward `progress` to the request's `on_progress` hook, if any.
    pub fn report_progress(&self, progress: Progress) {
        if let Some(hook) = &self.on_progress {
            hook.call(progress);
        }
    }
}

/// Raw response returned by a transport, before `after` decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A response whose body is `value` serialized as JSON.
    pub fn from_json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string()).with_header(CONTENT_TYPE, content_type::JSON)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Result<Value, PipelineError> {
        serde_json::from_slice(&self.body).map_err(|e| PipelineError::Decode(e.to_string()))
    }

    pub fn text(&self) -> Result<String, PipelineError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| PipelineError::Decode(e.to_string()))
    }

    pub fn blob(&self) -> Bytes {
        self.body.clone()
    }

    pub fn array_buffer(&self) -> Vec<u8> {
        self.body.to_vec()
    }

    /// Decode according to `res_type`. This is the default `after` hook.
    pub fn decode(&self, res_type: ResType) -> Result<Payload, PipelineError> {
        match res_type {
            ResType::Json => self.json().map(Payload::Json),
            ResType::Text => self.text().map(Payload::Text),
            ResType::Blob => Ok(Payload::Binary(self.blob())),
            ResType::ArrayBuffer => Ok(Payload::Binary(Bytes::from(self.array_buffer()))),
        }
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Payload::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Json(v) => write!(f, "{v}"),
            Payload::Text(s) => f.write_str(s),
            Payload::Binary(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// The part of a content type before any `;` parameters, lowercased.
pub(crate) fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
