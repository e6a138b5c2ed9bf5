//! Bound endpoints: a path plus endpoint-level options, reusable across
//! calls.
//!
//! Precedence is call-site options > endpoint config > instance defaults.
//! Building an endpoint does no I/O.

use serde::Serialize;

use crate::config::RequestOptions;
use crate::http::{content_type, HttpMethod, Payload, CONTENT_TYPE};
use crate::pipeline::Http;

#[derive(Debug, Clone)]
pub struct Endpoint {
    http: Http,
    path: String,
    config: RequestOptions,
}

impl Endpoint {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn config(&self) -> &RequestOptions {
        &self.config
    }

    /// Invoke the endpoint with call-site `options` layered over its config.
    pub async fn call<P>(&self, params: &P, options: RequestOptions) -> Option<Payload>
    where
        P: Serialize + ?Sized,
    {
        let options = self.config.clone().merge(options);
        self.http.request(&self.path, params, options).await
    }

    /// Invoke the endpoint with its own config only.
    pub async fn send<P>(&self, params: &P) -> Option<Payload>
    where
        P: Serialize + ?Sized,
    {
        self.call(params, RequestOptions::default()).await
    }
}

impl Http {
    /// Bind `path` and `config` into a reusable endpoint.
    pub fn sugar(&self, path: impl Into<String>, config: RequestOptions) -> Endpoint {
        Endpoint {
            http: self.clone(),
            path: path.into(),
            config,
        }
    }

    pub fn get(&self, path: impl Into<String>, config: RequestOptions) -> Endpoint {
        self.sugar(path, config.method(HttpMethod::Get))
    }

    pub fn post(&self, path: impl Into<String>, config: RequestOptions) -> Endpoint {
        self.sugar(path, config.method(HttpMethod::Post))
    }

    pub fn put(&self, path: impl Into<String>, config: RequestOptions) -> Endpoint {
        self.sugar(path, config.method(HttpMethod::Put))
    }

    pub fn delete(&self, path: impl Into<String>, config: RequestOptions) -> Endpoint {
        self.sugar(path, config.method(HttpMethod::Delete))
    }

    /// POST with an `application/x-www-form-urlencoded` body.
    pub fn form(&self, path: impl Into<String>, config: RequestOptions) -> Endpoint {
        let config = config
            .method(HttpMethod::Post)
            .header(CONTENT_TYPE, content_type::FORM);
        self.sugar(path, config)
    }

    /// POST with a `multipart/form-data` body.
    pub fn upload(&self, path: impl Into<String>, config: RequestOptions) -> Endpoint {
        let config = config
            .method(HttpMethod::Post)
            .header(CONTENT_TYPE, content_type::MULTIPART);
        self.sugar(path, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeTransport;
    use crate::http::ResType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn http_counting(calls: Arc<AtomicUsize>) -> Http {
        Http::builder()
            .transport(BridgeTransport::new(move |_, r| {
                calls.fetch_add(1, Ordering::SeqCst);
                r.fail("unused");
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn building_endpoints_does_no_io() {
        let calls = Arc::new(AtomicUsize::new(0));
        let http = http_counting(calls.clone());
        let _ = http.get("/a", RequestOptions::new());
        let _ = http.upload("/b", RequestOptions::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sugar_methods_fix_the_method() {
        let http = http_counting(Arc::new(AtomicUsize::new(0)));
        let cfg = RequestOptions::new;
        assert_eq!(http.get("/", cfg()).config().method, Some(HttpMethod::Get));
        assert_eq!(http.post("/", cfg()).config().method, Some(HttpMethod::Post));
        assert_eq!(http.put("/", cfg()).config().method, Some(HttpMethod::Put));
        assert_eq!(http.delete("/", cfg()).config().method, Some(HttpMethod::Delete));
    }

    #[test]
    fn fixed_method_beats_endpoint_config() {
        let http = http_counting(Arc::new(AtomicUsize::new(0)));
        let endpoint = http.get("/a", RequestOptions::new().method(HttpMethod::Post));
        assert_eq!(endpoint.config().method, Some(HttpMethod::Get));
    }

    #[test]
    fn form_and_upload_fix_content_type() {
        let http = http_counting(Arc::new(AtomicUsize::new(0)));
        let cfg = RequestOptions::new()
            .header(CONTENT_TYPE, content_type::JSON)
            .res_type(ResType::Text);
        let form = http.form("/f", cfg.clone());
        assert_eq!(form.config().method, Some(HttpMethod::Post));
        assert_eq!(form.config().headers.get(CONTENT_TYPE), Some(content_type::FORM));
        assert_eq!(form.config().res_type, Some(ResType::Text));
        let upload = http.upload("/u", cfg);
        assert_eq!(upload.config().headers.get(CONTENT_TYPE), Some(content_type::MULTIPART));
        assert_eq!(upload.path(), "/u");
    }
}
