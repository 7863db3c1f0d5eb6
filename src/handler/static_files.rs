//! Static file serving module
//!
//! Reads files under the configured root. `/` maps to the default document;
//! anything resolving outside the root is reported as not found.

use crate::config::Config;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StaticError {
    #[error("file not found")]
    NotFound,
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StaticError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Serve a GET request for `path` (query string already stripped)
pub async fn serve(path: &str, config: &Config) -> Response<Full<Bytes>> {
    let cors_on_errors = config.cors.on_errors;
    match load_file(
        &config.static_files.root,
        path,
        &config.static_files.default_document,
    )
    .await
    {
        Ok((content, content_type)) => http::build_file_response(content, content_type),
        Err(StaticError::NotFound) => http::build_404_response(cors_on_errors),
        Err(e) => {
            logger::log_error(&format!("Static file error: {e}"));
            http::build_500_response(cors_on_errors)
        }
    }
}

/// Map a request path to its file, `/` becoming the default document
pub fn resolve_request_path(path: &str, default_document: &str) -> String {
    if path == "/" {
        default_document.trim_start_matches('/').to_string()
    } else {
        path.trim_start_matches('/').to_string()
    }
}

/// Load a file from `root` and determine its content type
pub async fn load_file(
    root: &str,
    path: &str,
    default_document: &str,
) -> Result<(Vec<u8>, &'static str), StaticError> {
    let relative = resolve_request_path(path, default_document);
    let file_path = Path::new(root).join(&relative);

    let root_canonical = match Path::new(root).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static root not found or inaccessible '{root}': {e}"
            ));
            return Err(StaticError::NotFound);
        }
    };

    let file_canonical = file_path
        .canonicalize()
        .map_err(|e| StaticError::from_io(&file_path, e))?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_canonical.display()
        ));
        return Err(StaticError::NotFound);
    }

    let content = fs::read(&file_canonical)
        .await
        .map_err(|e| StaticError::from_io(&file_canonical, e))?;

    Ok((content, mime::get_content_type(&relative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    /// Fresh site directory: `site/` holds the served files, `secret.txt`
    /// sits next to it outside the root
    fn make_site() -> (TempDir, PathBuf) {
        let base = tempdir().unwrap();
        let site = base.path().join("site");
        std::fs::create_dir_all(site.join("js")).unwrap();
        std::fs::write(site.join("weather-demo.html"), "<h1>demo</h1>").unwrap();
        std::fs::write(site.join("js").join("app.js"), "console.log(1)").unwrap();
        std::fs::write(site.join("style.css"), "body{}").unwrap();
        std::fs::write(site.join("data.json"), "{}").unwrap();
        std::fs::write(base.path().join("secret.txt"), "secret").unwrap();
        (base, site)
    }

    #[test]
    fn test_resolve_request_path() {
        assert_eq!(resolve_request_path("/", "weather-demo.html"), "weather-demo.html");
        assert_eq!(resolve_request_path("/js/app.js", "index.html"), "js/app.js");
        assert_eq!(resolve_request_path("//a.css", "index.html"), "a.css");
    }

    #[tokio::test]
    async fn test_root_serves_default_document() {
        let (_base, site) = make_site();
        let (content, content_type) = load_file(site.to_str().unwrap(), "/", "weather-demo.html")
            .await
            .unwrap();
        assert_eq!(content, b"<h1>demo</h1>");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_content_types() {
        let (_base, site) = make_site();
        let root = site.to_str().unwrap();
        let (_, ct) = load_file(root, "/js/app.js", "x").await.unwrap();
        assert_eq!(ct, "application/javascript; charset=utf-8");
        let (_, ct) = load_file(root, "/style.css", "x").await.unwrap();
        assert_eq!(ct, "text/css; charset=utf-8");
        let (_, ct) = load_file(root, "/data.json", "x").await.unwrap();
        assert_eq!(ct, "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_base, site) = make_site();
        let result = load_file(site.to_str().unwrap(), "/nope.html", "x").await;
        assert!(matches!(result, Err(StaticError::NotFound)));
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let (_base, site) = make_site();
        let result = load_file(site.to_str().unwrap(), "/../secret.txt", "x").await;
        assert!(matches!(result, Err(StaticError::NotFound)));
    }

    #[tokio::test]
    async fn test_directory_is_io_error() {
        let (_base, site) = make_site();
        let result = load_file(site.to_str().unwrap(), "/js", "x").await;
        assert!(matches!(result, Err(StaticError::Io { .. })));
    }

    #[tokio::test]
    async fn test_serve_status_codes() {
        let (_base, site) = make_site();
        let mut cfg = Config::load_from("does-not-exist").unwrap();
        cfg.static_files.root = site.to_str().unwrap().to_string();

        let resp = serve("/", &cfg).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");

        let resp = serve("/missing.js", &cfg).await;
        assert_eq!(resp.status(), 404);
        assert!(resp.headers().get("access-control-allow-origin").is_none());

        let resp = serve("/js", &cfg).await;
        assert_eq!(resp.status(), 500);
    }
}
