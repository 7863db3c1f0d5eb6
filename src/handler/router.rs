//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Routes are an ordered table of
//! (method matcher, path matcher, action) entries; the first match wins.

use crate::config::AppState;
use crate::handler::{proxy, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// What to do with a matched request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// CORS preflight answer
    Preflight,
    /// Decode the envelope and forward it upstream
    Proxy,
    /// Serve a file from the static root
    StaticFile,
    /// 404 without reading the body
    NotFound,
    /// 501 for methods the relay does not serve
    NotImplemented,
}

/// Method matching condition
#[derive(Debug, Clone)]
pub enum MethodMatch {
    Any,
    OneOf(Vec<Method>),
}

impl MethodMatch {
    fn matches(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(methods) => methods.contains(method),
        }
    }
}

/// Path matching condition, applied to the raw request target
#[derive(Debug, Clone)]
pub enum PathMatch {
    Any,
    Prefix(String),
}

impl PathMatch {
    fn matches(&self, target: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => target.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub methods: MethodMatch,
    pub path: PathMatch,
    pub action: RouteAction,
}

/// Ordered route table
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub const fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The relay's fixed table. OPTIONS intercepts everything, then the proxy
    /// prefix, then static serving.
    pub fn relay(proxy_prefix: &str) -> Self {
        Self::new(vec![
            Route {
                methods: MethodMatch::OneOf(vec![Method::OPTIONS]),
                path: PathMatch::Any,
                action: RouteAction::Preflight,
            },
            Route {
                methods: MethodMatch::OneOf(vec![Method::GET, Method::POST]),
                path: PathMatch::Prefix(proxy_prefix.to_string()),
                action: RouteAction::Proxy,
            },
            Route {
                methods: MethodMatch::OneOf(vec![Method::GET]),
                path: PathMatch::Any,
                action: RouteAction::StaticFile,
            },
            Route {
                methods: MethodMatch::OneOf(vec![Method::POST]),
                path: PathMatch::Any,
                action: RouteAction::NotFound,
            },
            Route {
                methods: MethodMatch::Any,
                path: PathMatch::Any,
                action: RouteAction::NotImplemented,
            },
        ])
    }

    /// Find the first matching route
    pub fn match_route(&self, method: &Method, target: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.methods.matches(method) && route.path.matches(target))
    }

    /// Resolve the action for a request, 501 when nothing matches
    pub fn resolve(&self, method: &Method, target: &str) -> RouteAction {
        self.match_route(method, target)
            .map_or(RouteAction::NotImplemented, |route| route.action)
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path();
    let target = parts
        .uri
        .path_and_query()
        .map_or(path, |pq| pq.as_str());
    let cors_on_errors = state.config.cors.on_errors;

    let response = match state.routes.resolve(&parts.method, target) {
        RouteAction::Preflight => http::build_preflight_response(),
        RouteAction::Proxy => proxy::handle_proxy(body, &state).await,
        RouteAction::StaticFile => static_files::serve(path, &state.config).await,
        RouteAction::NotFound => http::build_404_response(cors_on_errors),
        RouteAction::NotImplemented => http::build_501_response(cors_on_errors),
    };

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.to_string(),
            parts.method.to_string(),
            target.to_string(),
        );
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.format);
    }

    Ok(response)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
