//! Fetch-style transport backed by a blocking `ureq` agent.
//!
//! Each request runs on tokio's blocking pool. The agent is configured to
//! hand back 4xx/5xx responses as data so the pipeline can classify them.

use std::io::Read;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use ureq::http::Response;
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

use crate::encode::FormData;
use crate::error::PipelineError;
use crate::http::{Body, Headers, HttpMethod, HttpRequest, HttpResponse, Progress, CONTENT_TYPE};
use crate::transport::Transport;

const CHUNK_SIZE: usize = 16 * 1024;

/// Encoded request body plus the content type it requires, if any.
struct Outgoing {
    content_type: Option<String>,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent. It should have
    /// `http_status_as_error(false)`, otherwise error statuses surface as
    /// transport failures instead of rejected responses.
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PipelineError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?
    }
}

fn execute(agent: &Agent, request: HttpRequest) -> Result<HttpResponse, PipelineError> {
    debug!(method = %request.method, url = %request.url, "dispatching request");
    let outgoing = encode(&request.body)?;
    let url = request.url.as_str();
    let headers = &request.headers;

    let result = match (request.method, outgoing) {
        (HttpMethod::Get, _) => with_headers(agent.get(url), headers).call(),
        (HttpMethod::Delete, None) => with_headers(agent.delete(url), headers).call(),
        (HttpMethod::Delete, body) => {
            send_body(with_headers(agent.delete(url), headers).force_send_body(), body)
        }
        (HttpMethod::Post, body) => send_body(with_headers(agent.post(url), headers), body),
        (HttpMethod::Put, body) => send_body(with_headers(agent.put(url), headers), body),
    };
    let mut response = result.map_err(|e| PipelineError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let response_headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let total = response_headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<u64>().ok());

    let mut reader = response.body_mut().as_reader();
    let mut body = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = reader
            .read(&mut chunk)
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
        request.report_progress(Progress {
            loaded: body.len() as u64,
            total,
        });
    }

    Ok(HttpResponse {
        status,
        headers: response_headers,
        body: Bytes::from(body),
    })
}

fn encode(body: &Body) -> Result<Option<Outgoing>, PipelineError> {
    let outgoing = match body {
        Body::Empty => return Ok(None),
        Body::Json(s) | Body::UrlEncoded(s) => Outgoing {
            content_type: None,
            data: s.clone().into_bytes(),
        },
        Body::Multipart(form) => {
            let boundary = FormData::boundary();
            Outgoing {
                content_type: Some(FormData::content_type(&boundary)),
                data: form.encode(&boundary),
            }
        }
        // Untyped maps go out as JSON.
        Body::Raw(params) => Outgoing {
            content_type: None,
            data: serde_json::to_vec(params)?,
        },
    };
    Ok(Some(outgoing))
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &Headers) -> RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

fn send_body(
    builder: RequestBuilder<WithBody>,
    outgoing: Option<Outgoing>,
) -> Result<Response<ureq::Body>, ureq::Error> {
    match outgoing {
        None => builder.send_empty(),
        Some(Outgoing { content_type, data }) => {
            let builder = match content_type {
                Some(ct) => builder.header(CONTENT_TYPE, ct),
                None => builder,
            };
            builder.send(&data[..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;

    #[test]
    fn empty_body_sends_nothing() {
        assert!(encode(&Body::Empty).unwrap().is_none());
    }

    #[test]
    fn multipart_gets_boundary_content_type() {
        let mut form = FormData::new();
        form.append("a", "1");
        let out = encode(&Body::Multipart(form)).unwrap().unwrap();
        let ct = out.content_type.unwrap();
        assert!(ct.starts_with("multipart/form-data; boundary="));
        let boundary = ct.split("boundary=").nth(1).unwrap();
        let body = String::from_utf8(out.data).unwrap();
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn raw_params_go_out_as_json() {
        let mut params = Params::new();
        params.insert("a".to_string(), serde_json::json!(1));
        let out = encode(&Body::Raw(params)).unwrap().unwrap();
        assert!(out.content_type.is_none());
        assert_eq!(out.data, br#"{"a":1}"#.to_vec());
    }
}
