//! Configurable HTTP request pipeline with per-URL GET caching and
//! cooperative cancellation.
//!
//! # Overview
//! An `Http` instance is configured once (base URL, default headers, hooks,
//! transport) and hands out reusable `Endpoint`s through `get`, `post`,
//! `put`, `delete`, `form` and `upload`. Each call cleans its parameters,
//! fills `:name` path placeholders, encodes a query string or a body driven
//! by `Content-Type`, optionally answers from the response cache, and runs
//! `before` → transport → `after` before classifying the result into
//! `on_success` or `on_fail`.
//!
//! # Design
//! - Calls never fail: they resolve to the decoded `Payload` or to whatever
//!   `on_fail` returns (`None` by default, after logging).
//! - Options resolve in three layers by plain data merging: call-site >
//!   endpoint > instance.
//! - The cache belongs to the instance, not to the process, so independent
//!   instances never see each other's entries.
//! - Transports sit behind the `Transport` trait; the pipeline only needs a
//!   status code and body bytes back.
//!
//! ```no_run
//! use http_pipeline::{Http, RequestOptions};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), http_pipeline::PipelineError> {
//! let http = Http::builder().base_url("http://localhost:3000").build()?;
//! let get_item = http.get("/api/items/:id", RequestOptions::new().cached(true));
//! let item = get_item.send(&json!({"id": 3, "q": "a"})).await;
//! # let _ = item;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod encode;
pub mod endpoint;
pub mod error;
#[cfg(feature = "ureq")]
pub mod fetch;
pub mod hooks;
pub mod http;
pub mod params;
pub mod pipeline;
pub mod transport;

pub use bridge::{BridgeTransport, Responder};
pub use cache::ResponseCache;
pub use cancel::CancelToken;
pub use config::{RequestOptions, Settings};
pub use encode::FormData;
pub use endpoint::Endpoint;
pub use error::{Failure, PipelineError};
#[cfg(feature = "ureq")]
pub use fetch::UreqTransport;
pub use hooks::{FailContext, SuccessContext};
pub use http::{content_type, Body, Headers, HttpMethod, HttpRequest, HttpResponse, Payload, Progress, ResType};
pub use params::Params;
pub use pipeline::{Http, HttpBuilder};
pub use transport::Transport;
