//! HTTP response building module
//!
//! Builders for every response the relay produces. Builders never panic:
//! a build failure is logged and replaced with an empty response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::Response;

use super::cors;

/// Content type asserted on every proxy response, success or failure
pub const PROXY_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Build CORS preflight response (200, empty body)
pub fn build_preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Access-Control-Allow-Origin", cors::ALLOW_ORIGIN)
        .header("Access-Control-Allow-Methods", cors::ALLOW_METHODS)
        .header("Access-Control-Allow-Headers", cors::ALLOW_HEADERS)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build proxy success response carrying the upstream bytes unchanged
pub fn build_proxy_response(upstream: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", PROXY_CONTENT_TYPE)
        .header("Access-Control-Allow-Origin", cors::ALLOW_ORIGIN)
        .body(Full::new(upstream))
        .unwrap_or_else(|e| {
            log_build_error("proxy 200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build proxy failure response with a serialized error envelope
pub fn build_proxy_error_response(envelope: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(500)
        .header("Content-Type", PROXY_CONTENT_TYPE)
        .header("Access-Control-Allow-Origin", cors::ALLOW_ORIGIN)
        .body(Full::new(Bytes::from(envelope)))
        .unwrap_or_else(|e| {
            log_build_error("proxy 500", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build static file response
pub fn build_file_response(data: Vec<u8>, content_type: &str) -> Response<Full<Bytes>> {
    let content_length = data.len();
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Access-Control-Allow-Origin", cors::ALLOW_ORIGIN)
        .body(Full::new(Bytes::from(data)))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response(cors: bool) -> Response<Full<Bytes>> {
    build_plain_error(404, "404 Not Found", cors)
}

/// Build 500 Internal Server Error response
pub fn build_500_response(cors: bool) -> Response<Full<Bytes>> {
    build_plain_error(500, "500 Internal Server Error", cors)
}

/// Build 501 Not Implemented response for methods the relay does not serve
pub fn build_501_response(cors: bool) -> Response<Full<Bytes>> {
    build_plain_error(501, "501 Not Implemented", cors)
}

fn build_plain_error(status: u16, text: &'static str, cors: bool) -> Response<Full<Bytes>> {
    with_origin(Response::builder(), cors)
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(text, &e);
            Response::new(Full::new(Bytes::from(text)))
        })
}

fn with_origin(builder: Builder, cors: bool) -> Builder {
    if cors {
        builder.header("Access-Control-Allow-Origin", cors::ALLOW_ORIGIN)
    } else {
        builder
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
