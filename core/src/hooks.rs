//! Hook types for each stage of the pipeline and the layered hook set.
//!
//! Every hook is an `Arc`'d closure so that instance defaults, endpoint
//! config and call options can all hold one cheaply. `before` and `after`
//! are asynchronous; the rest are plain callbacks.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use tracing::error;

use crate::error::{Failure, PipelineError};
use crate::http::{HttpRequest, HttpResponse, Payload, Progress, ResType};
use crate::params::Params;

/// Passed to `on_success`.
#[derive(Debug, Clone)]
pub struct SuccessContext {
    pub url: String,
    pub params: Params,
    pub res: Payload,
}

/// Passed to `on_fail`.
#[derive(Debug, Clone)]
pub struct FailContext {
    pub url: String,
    pub params: Params,
    pub res: Failure,
}

type BeforeFn = dyn Fn(HttpRequest) -> BoxFuture<'static, Result<HttpRequest, PipelineError>> + Send + Sync;
type AfterFn = dyn Fn(HttpResponse, ResType) -> BoxFuture<'static, Result<Payload, PipelineError>> + Send + Sync;

/// Rewrites the outgoing request (auth tokens, signing, extra headers).
#[derive(Clone)]
pub struct BeforeHook(Arc<BeforeFn>);

/// Decodes the raw response.
#[derive(Clone)]
pub struct AfterHook(Arc<AfterFn>);

/// Decides whether a decoded body counts as success.
#[derive(Clone)]
pub struct IsSuccessHook(Arc<dyn Fn(&Payload) -> bool + Send + Sync>);

#[derive(Clone)]
pub struct SuccessHook(Arc<dyn Fn(&SuccessContext) + Send + Sync>);

/// Its return value becomes the result of a failed call.
#[derive(Clone)]
pub struct FailHook(Arc<dyn Fn(FailContext) -> Option<Payload> + Send + Sync>);

#[derive(Clone)]
pub struct ProgressHook(Arc<dyn Fn(Progress) + Send + Sync>);

macro_rules! opaque_debug {
    ($($name:ident),*) => {
        $(
            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(concat!(stringify!($name), "(..)"))
                }
            }
        )*
    };
}

opaque_debug!(BeforeHook, AfterHook, IsSuccessHook, SuccessHook, FailHook, ProgressHook);

impl BeforeHook {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpRequest, PipelineError>> + Send + 'static,
    {
        Self(Arc::new(move |req| f(req).boxed()))
    }

    pub fn identity() -> Self {
        Self::new(|req| async move { Ok(req) })
    }

    pub async fn call(&self, req: HttpRequest) -> Result<HttpRequest, PipelineError> {
        (self.0)(req).await
    }
}

impl AfterHook {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HttpResponse, ResType) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, PipelineError>> + Send + 'static,
    {
        Self(Arc::new(move |raw, res_type| f(raw, res_type).boxed()))
    }

    /// Decode with `HttpResponse::decode`.
    pub fn decode() -> Self {
        Self::new(|raw: HttpResponse, res_type| async move { raw.decode(res_type) })
    }

    pub async fn call(&self, raw: HttpResponse, res_type: ResType) -> Result<Payload, PipelineError> {
        (self.0)(raw, res_type).await
    }
}

impl IsSuccessHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Payload) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Success means a JSON body whose `status` field is `0`.
    pub fn status_zero() -> Self {
        Self::new(|res| {
            res.as_json()
                .and_then(|v| v.get("status"))
                .and_then(|s| s.as_f64())
                == Some(0.0)
        })
    }

    pub fn call(&self, res: &Payload) -> bool {
        (self.0)(res)
    }
}

impl SuccessHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&SuccessContext) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn call(&self, ctx: &SuccessContext) {
        (self.0)(ctx)
    }
}

impl FailHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(FailContext) -> Option<Payload> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Log the failure and resolve the call to `None`.
    pub fn logging(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::new(move |ctx| {
            let params = serde_json::Value::Object(ctx.params);
            error!(tag = %tag, url = %ctx.url, %params, "request failed: {}", ctx.res);
            None
        })
    }

    pub fn call(&self, ctx: FailContext) -> Option<Payload> {
        (self.0)(ctx)
    }
}

impl ProgressHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, progress: Progress) {
        (self.0)(progress)
    }
}

/// Per-endpoint or per-call hook overrides. `None` falls through to the
/// next layer.
#[derive(Debug, Clone, Default)]
pub struct HookOverrides {
    pub before: Option<BeforeHook>,
    pub after: Option<AfterHook>,
    pub is_success: Option<IsSuccessHook>,
    pub on_success: Option<SuccessHook>,
    pub on_fail: Option<FailHook>,
    pub on_progress: Option<ProgressHook>,
}

impl HookOverrides {
    /// Overlay `over` on top of `self`; `over` wins where it is set.
    pub fn merge(self, over: HookOverrides) -> HookOverrides {
        HookOverrides {
            before: over.before.or(self.before),
            after: over.after.or(self.after),
            is_success: over.is_success.or(self.is_success),
            on_success: over.on_success.or(self.on_success),
            on_fail: over.on_fail.or(self.on_fail),
            on_progress: over.on_progress.or(self.on_progress),
        }
    }
}

/// A complete hook set, as held by an `Http` instance.
#[derive(Debug, Clone)]
pub struct HookSet {
    pub before: BeforeHook,
    pub after: AfterHook,
    pub is_success: IsSuccessHook,
    pub on_success: SuccessHook,
    pub on_fail: FailHook,
    pub on_progress: Option<ProgressHook>,
}

impl HookSet {
    /// Default hooks; `tag` prefixes the `on_fail` log line.
    pub fn with_tag(tag: &str) -> Self {
        Self {
            before: BeforeHook::identity(),
            after: AfterHook::decode(),
            is_success: IsSuccessHook::status_zero(),
            on_success: SuccessHook::noop(),
            on_fail: FailHook::logging(tag),
            on_progress: None,
        }
    }

    /// Fill every hook `overrides` leaves unset from `self`.
    pub fn resolve(&self, overrides: HookOverrides) -> HookSet {
        HookSet {
            before: overrides.before.unwrap_or_else(|| self.before.clone()),
            after: overrides.after.unwrap_or_else(|| self.after.clone()),
            is_success: overrides.is_success.unwrap_or_else(|| self.is_success.clone()),
            on_success: overrides.on_success.unwrap_or_else(|| self.on_success.clone()),
            on_fail: overrides.on_fail.unwrap_or_else(|| self.on_fail.clone()),
            on_progress: overrides.on_progress.or_else(|| self.on_progress.clone()),
        }
    }
}
