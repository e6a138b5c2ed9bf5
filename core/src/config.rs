//! Instance settings and per-call options.
//!
//! # Design
//! Options come in three layers: instance defaults (`Settings` plus the
//! instance `HookSet`), endpoint config, and call-site options. The last two
//! are both `RequestOptions`; `merge` overlays one on the other and the
//! pipeline resolves the result against the instance. Headers merge key by
//! key, everything else is "outer layer wins if set".

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::hooks::{
    AfterHook, BeforeHook, FailContext, FailHook, HookOverrides, IsSuccessHook, ProgressHook,
    SuccessContext, SuccessHook,
};
use crate::http::{
    content_type, Headers, HttpMethod, HttpRequest, HttpResponse, Payload, Progress, ResType, ACCEPT,
    CONTENT_TYPE,
};

pub const DEFAULT_BASE_URL: &str = "/";
pub const DEFAULT_TAG: &str = "[http]";

/// Serializable part of an instance's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub base_url: String,
    pub headers: Headers,
    /// Prefix for log lines and cancellation messages.
    pub tag: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: [(ACCEPT, content_type::JSON), (CONTENT_TYPE, content_type::JSON)]
                .into_iter()
                .collect(),
            tag: DEFAULT_TAG.to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON. Missing keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(raw).map_err(|e| PipelineError::Config(e.to_string()))
    }
}

/// Endpoint config or call-site options. Unset fields fall through to the
/// next layer.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<HttpMethod>,
    pub base_url: Option<String>,
    pub headers: Headers,
    pub res_type: Option<ResType>,
    /// GET only. `Some(true)` reads and writes the cache, `Some(false)`
    /// drops the entry and refetches, `None` bypasses the cache.
    pub cached: Option<bool>,
    pub cancel: Option<CancelToken>,
    pub hooks: HookOverrides,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `over` on top of `self`; `over` wins where it is set.
    pub fn merge(self, over: RequestOptions) -> RequestOptions {
        let mut headers = self.headers;
        headers.merge(&over.headers);
        RequestOptions {
            method: over.method.or(self.method),
            base_url: over.base_url.or(self.base_url),
            headers,
            res_type: over.res_type.or(self.res_type),
            cached: over.cached.or(self.cached),
            cancel: over.cancel.or(self.cancel),
            hooks: self.hooks.merge(over.hooks),
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: &Headers) -> Self {
        self.headers.merge(headers);
        self
    }

    pub fn res_type(mut self, res_type: ResType) -> Self {
        self.res_type = Some(res_type);
        self
    }

    pub fn cached(mut self, cached: bool) -> Self {
        self.cached = Some(cached);
        self
    }

    pub fn cancel(mut self, token: &CancelToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    pub fn before<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpRequest, PipelineError>> + Send + 'static,
    {
        self.hooks.before = Some(BeforeHook::new(f));
        self
    }

    pub fn after<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HttpResponse, ResType) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, PipelineError>> + Send + 'static,
    {
        self.hooks.after = Some(AfterHook::new(f));
        self
    }

    pub fn is_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&Payload) -> bool + Send + Sync + 'static,
    {
        self.hooks.is_success = Some(IsSuccessHook::new(f));
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&SuccessContext) + Send + Sync + 'static,
    {
        self.hooks.on_success = Some(SuccessHook::new(f));
        self
    }

    pub fn on_fail<F>(mut self, f: F) -> Self
    where
        F: Fn(FailContext) -> Option<Payload> + Send + Sync + 'static,
    {
        self.hooks.on_fail = Some(FailHook::new(f));
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.hooks.on_progress = Some(ProgressHook::new(f));
        self
    }
}
