//! The configured HTTP instance and its request pipeline.
//!
//! # Design
//! `Http` is a cheap-to-clone handle around shared state: settings, the
//! instance hook set, the transport and the response cache. Every call to
//! `request` resolves its options against the instance, encodes the
//! request, optionally consults the cache, then runs
//! `before` → transport → `after` with a cancellation checkpoint between
//! stages. Every outcome is delivered through `on_success` or `on_fail`,
//! and the call itself never fails: it resolves to the decoded payload or to
//! whatever `on_fail` returned.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::cancel::CancelToken;
use crate::config::{RequestOptions, Settings};
use crate::encode::{encode_body, to_query_string};
use crate::error::{Failure, PipelineError};
use crate::hooks::{
    AfterHook, BeforeHook, FailContext, FailHook, HookOverrides, HookSet, IsSuccessHook,
    ProgressHook, SuccessContext, SuccessHook,
};
use crate::http::{Body, Headers, HttpMethod, HttpRequest, HttpResponse, Payload, Progress, ResType};
use crate::params::{append_query, clean, fill_path, join, to_params, Params};
use crate::transport::Transport;

struct Inner {
    base_url: String,
    tag: String,
    headers: RwLock<Headers>,
    hooks: HookSet,
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
}

/// A configured request pipeline. Clones share configuration and cache.
#[derive(Clone)]
pub struct Http {
    inner: Arc<Inner>,
}

impl fmt::Debug for Http {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http")
            .field("base_url", &self.inner.base_url)
            .field("tag", &self.inner.tag)
            .field("headers", &self.headers())
            .field("cached_entries", &self.inner.cache.len())
            .finish()
    }
}

/// Options for one call after all layers have been resolved.
struct Call {
    method: HttpMethod,
    base_url: String,
    headers: Headers,
    res_type: ResType,
    cached: Option<bool>,
    cancel: CancelToken,
    hooks: HookSet,
}

impl Call {
    fn fail(&self, url: String, params: Params, res: Failure) -> Option<Payload> {
        self.hooks.on_fail.call(FailContext { url, params, res })
    }
}

impl Http {
    pub fn builder() -> HttpBuilder {
        HttpBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn tag(&self) -> &str {
        &self.inner.tag
    }

    /// Snapshot of the instance default headers.
    pub fn headers(&self) -> Headers {
        self.inner
            .headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change an instance default header. Affects calls started afterwards.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
    }

    pub fn remove_header(&self, name: &str) -> Option<String> {
        self.inner
            .headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// Drop the cached payload for a resolved URL. Returns whether one existed.
    pub fn invalidate(&self, url: &str) -> bool {
        self.inner.cache.remove(url).is_some()
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Tear the instance down: forget every cached response.
    pub fn unload(&self) {
        let dropped = self.inner.cache.len();
        self.inner.cache.clear();
        info!(tag = %self.inner.tag, dropped, "http instance unloaded");
    }

    fn resolve(&self, options: RequestOptions) -> Call {
        let mut headers = self.headers();
        headers.merge(&options.headers);
        Call {
            method: options.method.unwrap_or_default(),
            base_url: options
                .base_url
                .unwrap_or_else(|| self.inner.base_url.clone()),
            headers,
            res_type: options.res_type.unwrap_or_default(),
            cached: options.cached,
            cancel: options.cancel.unwrap_or_default(),
            hooks: self.inner.hooks.resolve(options.hooks),
        }
    }

    /// Run one request through the pipeline.
    ///
    /// `params` must serialize to a JSON object (or to `null` for none).
    /// Resolves to the decoded payload on success, otherwise to the value
    /// returned by `on_fail`.
    pub async fn request<P>(&self, path: &str, params: &P, options: RequestOptions) -> Option<Payload>
    where
        P: Serialize + ?Sized,
    {
        let call = self.resolve(options);
        let params = to_params(params).map(clean);

        if let Err(err) = call.cancel.checkpoint(&self.inner.tag) {
            let params = params.unwrap_or_default();
            return call.fail(path.to_string(), params, err.into());
        }
        let mut params = match params {
            Ok(params) => params,
            Err(err) => return call.fail(path.to_string(), Params::new(), err.into()),
        };

        let mut headers = call.headers.clone();
        let mut url = fill_path(&join(&call.base_url, path), &mut params);
        let body = if call.method == HttpMethod::Get {
            url = append_query(&url, &to_query_string(&params));
            Body::Empty
        } else {
            match encode_body(&mut headers, &params) {
                Ok(body) => body,
                Err(err) => return call.fail(url, params, err.into()),
            }
        };

        if call.method == HttpMethod::Get {
            match call.cached {
                Some(true) => {
                    if let Some(res) = self.inner.cache.get(&url) {
                        debug!(url = %url, "cache hit");
                        let ctx = SuccessContext { url, params, res };
                        call.hooks.on_success.call(&ctx);
                        return Some(ctx.res);
                    }
                }
                Some(false) => {
                    if self.inner.cache.remove(&url).is_some() {
                        debug!(url = %url, "cache entry invalidated");
                    }
                }
                None => {}
            }
        }

        let request = HttpRequest {
            method: call.method,
            url: url.clone(),
            params: params.clone(),
            headers,
            body,
            res_type: call.res_type,
            on_progress: None,
        };

        match self.exchange(&call, request).await {
            Err(err) => call.fail(url, params, Failure::Error(err)),
            Ok((status, body)) if status >= 400 || !call.hooks.is_success.call(&body) => {
                call.fail(url, params, Failure::Rejected { status, body })
            }
            Ok((_, res)) => {
                let ctx = SuccessContext { url, params, res };
                call.hooks.on_success.call(&ctx);
                if call.method == HttpMethod::Get && call.cached.is_some() {
                    self.inner.cache.insert(ctx.url.clone(), ctx.res.clone());
                }
                Some(ctx.res)
            }
        }
    }

    /// `before` → transport → `after`, checking for cancellation around
    /// each stage.
    async fn exchange(&self, call: &Call, request: HttpRequest) -> Result<(u16, Payload), PipelineError> {
        let tag = self.inner.tag.as_str();
        call.cancel.checkpoint(tag)?;
        let mut request = call.hooks.before.call(request).await?;
        call.cancel.checkpoint(tag)?;

        request.on_progress = call.hooks.on_progress.clone();
        request.res_type = call.res_type;
        debug!(method = %request.method, url = %request.url, "sending request");
        let raw = self.inner.transport.send(request).await?;
        call.cancel.checkpoint(tag)?;

        let status = raw.status;
        let res = call.hooks.after.call(raw, call.res_type).await?;
        call.cancel.checkpoint(tag)?;
        Ok((status, res))
    }
}

/// Builder for `Http`.
///
/// ```no_run
/// use http_pipeline::Http;
///
/// let http = Http::builder()
///     .base_url("http://localhost:3000")
///     .header("Authorization", "Bearer token")
///     .is_success(|res| res.as_json().is_some_and(|v| v["statusCode"] == 0))
///     .build()?;
/// # Ok::<(), http_pipeline::PipelineError>(())
/// ```
#[derive(Default)]
pub struct HttpBuilder {
    settings: Settings,
    hooks: HookOverrides,
    transport: Option<Arc<dyn Transport>>,
}

impl HttpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace base URL, default headers and tag in one go.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.headers.insert(name, value);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.settings.tag = tag.into();
        self
    }

    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
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

    fn validate(&self) -> Result<(), PipelineError> {
        let base = &self.settings.base_url;
        if base.contains("://") {
            url::Url::parse(base)
                .map_err(|e| PipelineError::Config(format!("invalid base URL '{base}': {e}")))?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Http, PipelineError> {
        self.validate()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        let hooks = HookSet::with_tag(&self.settings.tag).resolve(self.hooks);
        Ok(Http {
            inner: Arc::new(Inner {
                base_url: self.settings.base_url,
                tag: self.settings.tag,
                headers: RwLock::new(self.settings.headers),
                hooks,
                transport,
                cache: ResponseCache::new(),
            }),
        })
    }
}

#[cfg(feature = "ureq")]
fn default_transport() -> Result<Arc<dyn Transport>, PipelineError> {
    Ok(Arc::new(crate::fetch::UreqTransport::new()))
}

#[cfg(not(feature = "ureq"))]
fn default_transport() -> Result<Arc<dyn Transport>, PipelineError> {
    Err(PipelineError::Config(
        "no transport configured and the `ureq` feature is disabled".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeTransport;
    use crate::http::content_type;

    fn http() -> Http {
        Http::builder()
            .base_url("http://api.test")
            .transport(BridgeTransport::new(|_, r| r.fail("unused")))
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_layers_headers_over_instance_defaults() {
        let http = http();
        let call = http.resolve(RequestOptions::new().header("Content-Type", content_type::FORM));
        assert_eq!(call.headers.get("accept"), Some(content_type::JSON));
        assert_eq!(call.headers.get("content-type"), Some(content_type::FORM));
        assert_eq!(call.method, HttpMethod::Get);
        assert_eq!(call.res_type, ResType::Json);
        assert_eq!(call.base_url, "http://api.test");
        assert!(call.cached.is_none());
    }

    #[test]
    fn call_base_url_overrides_instance() {
        let call = http().resolve(RequestOptions::new().base_url("http://other"));
        assert_eq!(call.base_url, "http://other");
    }

    #[test]
    fn set_and_remove_header() {
        let http = http();
        http.set_header("Authorization", "Bearer 1");
        assert_eq!(http.headers().get("authorization"), Some("Bearer 1"));
        assert_eq!(http.remove_header("AUTHORIZATION").as_deref(), Some("Bearer 1"));
        assert!(http.headers().get("authorization").is_none());
    }

    #[test]
    fn clones_share_the_cache() {
        let http = http();
        let other = http.clone();
        http.cache().insert("/a", Payload::Text("a".to_string()));
        assert!(other.cache().contains("/a"));
        assert!(other.invalidate("/a"));
        assert!(!http.invalidate("/a"));
    }

    #[test]
    fn unload_clears_the_cache() {
        let http = http();
        http.cache().insert("/a", Payload::Text("a".to_string()));
        http.unload();
        assert!(http.cache().is_empty());
    }

    #[test]
    fn invalid_absolute_base_url_is_rejected() {
        let err = Http::builder()
            .base_url("http://[::1")
            .transport(BridgeTransport::new(|_, r| r.fail("unused")))
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn relative_base_url_is_accepted() {
        let http = Http::builder()
            .base_url("/api")
            .transport(BridgeTransport::new(|_, r| r.fail("unused")))
            .build()
            .unwrap();
        assert_eq!(http.base_url(), "/api");
    }

    #[test]
    fn settings_feed_the_builder() {
        let settings = Settings::from_json(r#"{"baseUrl":"http://h","tag":"[api]"}"#).unwrap();
        let http = Http::builder()
            .settings(settings)
            .transport(BridgeTransport::new(|_, r| r.fail("unused")))
            .build()
            .unwrap();
        assert_eq!(http.base_url(), "http://h");
        assert_eq!(http.tag(), "[api]");
    }
}
