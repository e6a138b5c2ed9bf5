//! Parameter handling: cleaning, URL joining and `:name` path templating.

use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::PipelineError;

/// Request parameters. Insertion order is preserved, so query strings and
/// bodies list keys in the order the caller wrote them.
pub type Params = serde_json::Map<String, Value>;

/// Characters escaped in a substituted path segment: the URL path set plus
/// `/` and `%`, so a value always stays inside its own segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-zA-Z]+)").expect("placeholder pattern is valid"));

/// Serialize any value into `Params`.
///
/// Unit and `None` serialize to `null` and mean "no parameters". Anything
/// that does not serialize to an object is rejected.
pub fn to_params<P: Serialize + ?Sized>(params: &P) -> Result<Params, PipelineError> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Params::new()),
        other => Err(PipelineError::Encode(format!(
            "parameters must serialize to an object, got {other}"
        ))),
    }
}

/// Drop keys whose value is `null`. Empty strings, `0` and `false` are kept.
pub fn clean(params: Params) -> Params {
    params.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

/// Join `base` and `path` with exactly one `/` between them.
pub fn join(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Replace every `:name` placeholder in `url` with the matching parameter,
/// removing consumed keys from `params`. Substituted values are
/// percent-encoded as a single path segment.
///
/// Placeholders without a matching parameter are left as written.
pub fn fill_path(url: &str, params: &mut Params) -> String {
    PLACEHOLDER
        .replace_all(url, |caps: &Captures| {
            let key = &caps[1];
            match params.shift_remove(key) {
                Some(value) => utf8_percent_encode(&render(&value), PATH_SEGMENT).to_string(),
                None => {
                    warn!(url, placeholder = key, "no parameter for path placeholder");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Append an already-encoded query string to `url`.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Render a parameter value the way it appears in a URL, query string or
/// form field.
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        to_params(&value).unwrap()
    }

    #[test]
    fn clean_keeps_falsy_values() {
        let cleaned = clean(params(json!({
            "a": null, "b": "", "c": 0, "d": false, "e": "x"
        })));
        let keys: Vec<_> = cleaned.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c", "d", "e"]);
    }

    #[test]
    fn join_puts_exactly_one_slash_at_the_seam() {
        assert_eq!(join("http://h/", "/api"), "http://h/api");
        assert_eq!(join("http://h", "api"), "http://h/api");
        assert_eq!(join("http://h/", "api"), "http://h/api");
        assert_eq!(join("http://h", "/api"), "http://h/api");
        assert_eq!(join("/", "/api"), "/api");
        assert_eq!(join("", "/api"), "/api");
        assert_eq!(join("http://h", ""), "http://h");
    }

    #[test]
    fn fill_path_consumes_keys_in_order() {
        let mut p = params(json!({"id": 7, "name": "x", "sub": "tags"}));
        let url = fill_path("/user/:id/:sub", &mut p);
        assert_eq!(url, "/user/7/tags");
        assert_eq!(p, params(json!({"name": "x"})));
    }

    #[test]
    fn fill_path_percent_encodes_values() {
        let mut p = params(json!({"id": "a b", "dir": "x/y?#", "city": "Zürich"}));
        let url = fill_path("/files/:dir/:id/:city", &mut p);
        assert_eq!(url, "/files/x%2Fy%3F%23/a%20b/Z%C3%BCrich");
        assert!(p.is_empty());
    }

    #[test]
    fn fill_path_ignores_port_numbers() {
        let mut p = params(json!({"id": 1}));
        assert_eq!(fill_path("http://localhost:3000/a/:id", &mut p), "http://localhost:3000/a/1");
    }

    #[test]
    fn fill_path_leaves_unmatched_placeholders() {
        let mut p = Params::new();
        assert_eq!(fill_path("/user/:id", &mut p), "/user/:id");
    }

    #[test]
    fn append_query_picks_separator() {
        assert_eq!(append_query("/a", "x=1"), "/a?x=1");
        assert_eq!(append_query("/a?y=2", "x=1"), "/a?y=2&x=1");
        assert_eq!(append_query("/a", ""), "/a");
    }

    #[test]
    fn to_params_accepts_structs_and_unit() {
        #[derive(Serialize)]
        struct Query {
            page: u32,
            label: Option<String>,
        }
        let p = to_params(&Query { page: 2, label: None }).unwrap();
        assert_eq!(p, params(json!({"page": 2, "label": null})));
        assert!(to_params(&()).unwrap().is_empty());
        assert!(matches!(to_params(&3), Err(PipelineError::Encode(_))));
    }

    #[test]
    fn render_values() {
        assert_eq!(render(&json!("a b")), "a b");
        assert_eq!(render(&json!(1.5)), "1.5");
        assert_eq!(render(&json!(true)), "true");
        assert_eq!(render(&json!([1, null, "x"])), "1,,x");
        assert_eq!(render(&json!({"k": 1})), r#"{"k":1}"#);
    }
}
