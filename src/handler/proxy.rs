//! Proxy dispatch module
//!
//! Decodes the JSON envelope from the request body, issues exactly one
//! outbound call and passes the upstream bytes back unchanged. Every failure
//! along the way collapses into one [`ProxyError`] and one error envelope.

use crate::config::AppState;
use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::Response;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Any failure while proxying, carrying the full description of its cause
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct ProxyError {
    cause: String,
}

impl ProxyError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    fn from_source(err: &(dyn std::error::Error + 'static)) -> Self {
        Self {
            cause: describe(err),
        }
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::from_source(&err)
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        Self::from_source(&err)
    }
}

impl From<BoxError> for ProxyError {
    fn from(err: BoxError) -> Self {
        Self::from_source(err.as_ref())
    }
}

/// Render an error followed by its source chain: `outer: inner: root`
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let inner_text = inner.to_string();
        if !text.contains(&inner_text) {
            text.push_str(": ");
            text.push_str(&inner_text);
        }
        source = inner.source();
    }
    text
}

/// Outbound method selected by the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMethod {
    Get,
    Post,
}

impl ProxyMethod {
    /// Only a case-insensitive `POST` selects POST; anything else is GET
    pub fn parse(method: Option<&str>) -> Self {
        match method {
            Some(m) if m.eq_ignore_ascii_case("POST") => Self::Post,
            _ => Self::Get,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// JSON body of a proxy request
///
/// Absent and `null` fields take their defaults: empty `url`, `GET`, and no data.
/// `data` keeps the key order of the request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyRequestEnvelope {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl ProxyRequestEnvelope {
    /// Decode a request body. An empty body is the all-defaults envelope;
    /// anything but a JSON object is rejected.
    pub fn decode(body: &[u8]) -> Result<Self, ProxyError> {
        if body.is_empty() {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => Ok(serde_json::from_value(Value::Object(fields))?),
            other => Err(ProxyError::new(format!(
                "request body must be a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    pub fn method(&self) -> ProxyMethod {
        ProxyMethod::parse(self.method.as_deref())
    }

    /// `data` as key/value pairs for query or form encoding, in body order.
    ///
    /// `null` values are dropped. An array repeats its key once per non-null
    /// element; an object repeats it once per member name.
    pub fn form_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs = Vec::new();
        for (key, value) in self.data.iter().flatten() {
            match value {
                Value::Null => {}
                Value::Array(items) => pairs.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (key.as_str(), form_text(item))),
                ),
                Value::Object(members) => {
                    pairs.extend(members.keys().map(|name| (key.as_str(), name.clone())));
                }
                scalar => pairs.push((key.as_str(), form_text(scalar))),
            }
        }
        pairs
    }
}

/// Text of one form value. Booleans render as `True` / `False`.
fn form_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(true) => String::from("True"),
        Value::Bool(false) => String::from("False"),
        other => other.to_string(),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Error body returned on any proxy failure
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub error: &'a str,
    pub message: &'a str,
}

impl ErrorEnvelope<'_> {
    pub fn to_json(&self) -> String {
        // serde_json writes non-ASCII characters as-is
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Build the outbound request: GET carries `data` as query parameters,
/// POST as a form-urlencoded body
pub fn build_request(
    client: &reqwest::Client,
    envelope: &ProxyRequestEnvelope,
) -> reqwest::RequestBuilder {
    let pairs = envelope.form_pairs();
    match envelope.method() {
        ProxyMethod::Post => client.post(envelope.url()).form(&pairs),
        ProxyMethod::Get => client.get(envelope.url()).query(&pairs),
    }
}

/// Issue the single outbound call and return the upstream body bytes
pub async fn forward(
    client: &reqwest::Client,
    envelope: &ProxyRequestEnvelope,
) -> Result<Bytes, ProxyError> {
    let response = build_request(client, envelope).send().await?;
    Ok(response.bytes().await?)
}

async fn read_body<B>(body: B, max_body_size: u64) -> Result<Bytes, ProxyError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let collected = Limited::new(body, limit).collect().await?;
    Ok(collected.to_bytes())
}

async fn dispatch<B>(body: B, state: &AppState) -> Result<Bytes, ProxyError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let raw = read_body(body, state.config.proxy.max_body_size).await?;
    let envelope = ProxyRequestEnvelope::decode(&raw)?;
    logger::log_proxy_request(envelope.method().as_str(), envelope.url());
    forward(&state.client, &envelope).await
}

/// Handle a request routed to the proxy endpoint
pub async fn handle_proxy<B>(body: B, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    match dispatch(body, state).await {
        Ok(upstream) => http::build_proxy_response(upstream),
        Err(e) => {
            logger::log_proxy_error(&e);
            let envelope = ErrorEnvelope {
                error: e.cause(),
                message: &state.config.proxy.error_message,
            };
            http::build_proxy_error_response(envelope.to_json())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> reqwest::Client {
        reqwest::Client::new()
    }

    fn envelope(json: &str) -> ProxyRequestEnvelope {
        ProxyRequestEnvelope::decode(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_method_defaults_to_get() {
        assert_eq!(envelope(r#"{"url":"http://a.test/"}"#).method(), ProxyMethod::Get);
        assert_eq!(
            envelope(r#"{"url":"http://a.test/","method":null}"#).method(),
            ProxyMethod::Get
        );
        assert_eq!(
            envelope(r#"{"url":"http://a.test/","method":"DELETE"}"#).method(),
            ProxyMethod::Get
        );
    }

    #[test]
    fn test_method_post_any_case() {
        for m in ["POST", "post", "Post", "pOsT"] {
            let env = envelope(&format!(r#"{{"url":"http://a.test/","method":"{m}"}}"#));
            assert_eq!(env.method(), ProxyMethod::Post, "method {m}");
        }
    }

    #[test]
    fn test_empty_body_is_default_envelope() {
        let env = ProxyRequestEnvelope::decode(b"").unwrap();
        assert_eq!(env.url(), "");
        assert_eq!(env.method(), ProxyMethod::Get);
        assert!(env.form_pairs().is_empty());
    }

    #[test]
    fn test_invalid_json_is_proxy_error() {
        let err = ProxyRequestEnvelope::decode(b"{\"url\":").unwrap_err();
        assert!(!err.cause().is_empty());
        assert!(ProxyRequestEnvelope::decode(b"null").is_err());
    }

    #[test]
    fn test_non_object_body_is_proxy_error() {
        let err = ProxyRequestEnvelope::decode(br#"["http://x","POST",{}]"#).unwrap_err();
        assert!(err.cause().contains("an array"), "{}", err.cause());
        assert!(ProxyRequestEnvelope::decode(b"\"http://x\"").is_err());
        assert!(ProxyRequestEnvelope::decode(b"  {\"url\":\"http://x\"}").is_ok());
    }

    #[test]
    fn test_data_keeps_body_order() {
        let env = envelope(r#"{"url":"http://example.test/echo","data":{"b":"1","a":"2"}}"#);
        let req = build_request(&client(), &env).build().unwrap();
        assert_eq!(req.url().as_str(), "http://example.test/echo?b=1&a=2");
    }

    #[test]
    fn test_scalar_data_values() {
        let env = envelope(
            r#"{"url":"u","data":{"city":"北京","n":3,"f":2.5,"on":true,"off":false}}"#,
        );
        assert_eq!(
            env.form_pairs(),
            vec![
                ("city", "北京".to_string()),
                ("n", "3".to_string()),
                ("f", "2.5".to_string()),
                ("on", "True".to_string()),
                ("off", "False".to_string()),
            ]
        );
    }

    #[test]
    fn test_null_data_values_are_skipped() {
        let env = envelope(r#"{"url":"http://example.test/echo","data":{"a":"1","skip":null}}"#);
        let req = build_request(&client(), &env).build().unwrap();
        assert_eq!(req.url().as_str(), "http://example.test/echo?a=1");
    }

    #[test]
    fn test_array_and_object_values_repeat_key() {
        let env = envelope(r#"{"url":"u","data":{"id":[1,null,"x"],"k":{"p":1,"q":2}}}"#);
        assert_eq!(
            env.form_pairs(),
            vec![
                ("id", "1".to_string()),
                ("id", "x".to_string()),
                ("k", "p".to_string()),
                ("k", "q".to_string()),
            ]
        );
    }

    #[test]
    fn test_post_form_keeps_body_order() {
        let env = envelope(
            r#"{"url":"http://example.test/login","method":"POST","data":{"z":"1","a":true}}"#,
        );
        let req = build_request(&client(), &env).build().unwrap();
        let body = req.body().and_then(reqwest::Body::as_bytes).unwrap();
        assert_eq!(body, b"z=1&a=True");
    }

    #[test]
    fn test_get_encodes_query() {
        let env = envelope(r#"{"url":"http://example.test/echo","method":"GET","data":{"q":"1"}}"#);
        let req = build_request(&client(), &env).build().unwrap();
        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(req.url().as_str(), "http://example.test/echo?q=1");
        assert!(req.body().is_none());
    }

    #[test]
    fn test_get_keeps_existing_query() {
        let env = envelope(r#"{"url":"http://example.test/w?key=abc","data":{"city":"a b"}}"#);
        let req = build_request(&client(), &env).build().unwrap();
        assert_eq!(req.url().as_str(), "http://example.test/w?key=abc&city=a+b");
    }

    #[test]
    fn test_get_without_data_has_no_query() {
        let env = envelope(r#"{"url":"http://example.test/echo"}"#);
        let req = build_request(&client(), &env).build().unwrap();
        assert_eq!(req.url().as_str(), "http://example.test/echo");
        assert!(req.url().query().is_none());
    }

    #[test]
    fn test_post_encodes_form_body() {
        let env = envelope(
            r#"{"url":"http://example.test/login","method":"post","data":{"Account":"u","password":"p w"}}"#,
        );
        let req = build_request(&client(), &env).build().unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().as_str(), "http://example.test/login");
        assert_eq!(
            req.headers()[reqwest::header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = req.body().and_then(reqwest::Body::as_bytes).unwrap();
        assert_eq!(body, b"Account=u&password=p+w");
    }

    #[test]
    fn test_post_without_data_has_empty_body() {
        let env = envelope(r#"{"url":"http://example.test/login","method":"POST"}"#);
        let req = build_request(&client(), &env).build().unwrap();
        let body = req.body().and_then(reqwest::Body::as_bytes).unwrap_or_default();
        assert!(body.is_empty());
    }

    #[test]
    fn test_relative_url_fails_to_build() {
        let env = envelope(r#"{"url":"not a url"}"#);
        assert!(build_request(&client(), &env).build().is_err());
    }

    #[test]
    fn test_error_envelope_not_ascii_escaped() {
        let json = ErrorEnvelope {
            error: "builder error",
            message: "代理请求失败",
        }
        .to_json();
        assert_eq!(json, r#"{"error":"builder error","message":"代理请求失败"}"#);
    }

    #[test]
    fn test_describe_includes_source_chain() {
        let inner = std::io::Error::other("connection refused");
        let outer: BoxError = Box::new(std::io::Error::other(inner));
        let err = ProxyError::from(outer);
        assert!(err.cause().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_body_limit_is_proxy_error() {
        let body = Full::new(Bytes::from_static(b"0123456789"));
        let err = read_body(body, 4).await.unwrap_err();
        assert!(!err.cause().is_empty());

        let body = Full::new(Bytes::from_static(b"0123"));
        assert_eq!(read_body(body, 4).await.unwrap(), Bytes::from_static(b"0123"));
    }
}
