//! Pluggable "send a request, get a raw response" strategy.
//!
//! # Design
//! The pipeline only needs a status code and the body accessors on
//! `HttpResponse`, so any client (a native HTTP agent, a host bridge, a test
//! stub) can sit behind this trait. Status codes >= 400 are data, not
//! errors: the pipeline classifies them itself. Return `Err` only when no
//! response could be obtained at all.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::http::{HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request` and return the raw response.
    ///
    /// Implementations that can observe progress should forward it through
    /// `HttpRequest::report_progress`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PipelineError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PipelineError> {
        (**self).send(request).await
    }
}
