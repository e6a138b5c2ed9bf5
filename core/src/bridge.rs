//! Callback transport for hosts that perform the I/O themselves.
//!
//! The host gets the encoded `HttpRequest` together with a one-shot
//! `Responder` and answers from whatever thread or event loop it likes,
//! the way mini-app runtimes and XHR-style APIs report through success and
//! fail callbacks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::error::PipelineError;
use crate::hooks::ProgressHook;
use crate::http::{HttpRequest, HttpResponse, Progress};
use crate::transport::Transport;

type Answer = Result<HttpResponse, PipelineError>;

/// One-shot reply handle given to the host with each request.
///
/// Dropping it without answering fails the request.
pub struct Responder {
    tx: oneshot::Sender<Answer>,
    url: String,
    on_progress: Option<ProgressHook>,
}

impl Responder {
    pub fn success(self, response: HttpResponse) {
        let _ = self.tx.send(Ok(response));
    }

    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.tx.send(Err(PipelineError::Transport(reason.into())));
    }

    /// Forward a progress event to the request's `on_progress` hook.
    pub fn progress(&self, loaded: u64, total: Option<u64>) {
        if let Some(hook) = &self.on_progress {
            hook.call(Progress { loaded, total });
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder").field("url", &self.url).finish()
    }
}

type HostFn = dyn Fn(HttpRequest, Responder) + Send + Sync;

#[derive(Clone)]
pub struct BridgeTransport {
    host: Arc<HostFn>,
}

impl BridgeTransport {
    pub fn new<F>(host: F) -> Self
    where
        F: Fn(HttpRequest, Responder) + Send + Sync + 'static,
    {
        Self { host: Arc::new(host) }
    }
}

impl fmt::Debug for BridgeTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BridgeTransport(..)")
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PipelineError> {
        let (tx, rx) = oneshot::channel();
        let responder = Responder {
            tx,
            url: request.url.clone(),
            on_progress: request.on_progress.clone(),
        };
        (self.host)(request, responder);
        rx.await.map_err(|_| {
            PipelineError::Transport("host dropped the request without answering".to_string())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn host_success_is_delivered() {
        let bridge = BridgeTransport::new(|req, responder| {
            let body = format!("{} {}", req.method, req.url);
            responder.success(HttpResponse::new(200, body));
        });
        let raw = bridge.send(HttpRequest::new(HttpMethod::Get, "/a")).await.unwrap();
        assert_eq!(raw.text().unwrap(), "GET /a");
    }

    #[tokio::test]
    async fn host_failure_is_a_transport_error() {
        let bridge = BridgeTransport::new(|_, responder| responder.fail("offline"));
        let err = bridge.send(HttpRequest::new(HttpMethod::Get, "/a")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport(ref m) if m == "offline"));
    }

    #[tokio::test]
    async fn dropped_responder_fails_the_request() {
        let bridge = BridgeTransport::new(|_, responder| drop(responder));
        let err = bridge.send(HttpRequest::new(HttpMethod::Get, "/a")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport(_)));
    }

    #[tokio::test]
    async fn host_may_answer_from_another_thread() {
        let bridge = BridgeTransport::new(|_, responder| {
            std::thread::spawn(move || {
                responder.progress(5, Some(5));
                responder.success(HttpResponse::new(201, "done"));
            });
        });
        let loaded = Arc::new(AtomicU64::new(0));
        let seen = loaded.clone();
        let mut req = HttpRequest::new(HttpMethod::Post, "/upload");
        req.on_progress = Some(ProgressHook::new(move |p| seen.store(p.loaded, Ordering::SeqCst)));
        let raw = bridge.send(req).await.unwrap();
        assert_eq!(raw.status, 201);
        assert_eq!(loaded.load(Ordering::SeqCst), 5);
    }
}
