//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: route matching, method
//! validation, body size guard, dispatch and access logging.

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::{api, pages};
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Known endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Script,
    ListFiles,
    Download,
    Upload,
}

impl Route {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" | "/index.html" => Some(Self::Index),
            "/static/script.js" => Some(Self::Script),
            "/api/files" => Some(Self::ListFiles),
            "/api/download" => Some(Self::Download),
            "/api/upload" => Some(Self::Upload),
            _ => None,
        }
    }

    /// Value of the `Allow` header for this route
    pub const fn allow(self) -> &'static str {
        match self {
            Self::Upload => "POST, OPTIONS",
            _ => "GET, HEAD, OPTIONS",
        }
    }

    pub fn accepts(self, method: &Method) -> bool {
        match self {
            Self::Upload => method == Method::POST,
            _ => method == Method::GET || method == Method::HEAD,
        }
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
    B::Error: std::fmt::Display,
{
    let started = Instant::now();
    let access_entry = state
        .access_log_enabled()
        .then(|| access_entry_for(&req, peer_addr));

    let mut response = route_request(req, &state).await;

    if let Ok(server_name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server_name);
    }

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Match route and method, then dispatch
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();

    let Some(route) = Route::from_path(req.uri().path()) else {
        return http::build_404_response();
    };

    if method == Method::OPTIONS {
        return http::build_options_response(route.allow(), state.config.http.enable_cors);
    }
    if !route.accepts(&method) {
        logger::log_warning(&format!(
            "Method not allowed: {method} {}",
            req.uri().path()
        ));
        return http::build_405_response(route.allow());
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    let is_head = method == Method::HEAD;
    let query = req.uri().query().map(ToString::to_string);

    match route {
        Route::Index => pages::serve_index(is_head),
        Route::Script => pages::serve_script(is_head),
        Route::ListFiles => api::list_files(state, query.as_deref(), is_head).await,
        Route::Download => api::download_file(state, query.as_deref(), is_head).await,
        Route::Upload => api::upload_files(req, state).await,
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: Option<u64>) -> Option<Response<Full<Bytes>>> {
    let max_body_size = max_body_size?;
    let content_length = req.headers().get("content-length")?;
    match content_length.to_str().ok().and_then(|s| s.parse::<u64>().ok()) {
        Some(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Some(_) => None,
        None => {
            logger::log_warning("Invalid Content-Length header, skipping size check");
            None
        }
    }
}

fn access_entry_for<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::multipart::tests as form;
    use crate::storage::RootDir;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn state_for(dir: &std::path::Path) -> Arc<AppState> {
        let mut config = Config::load_from("does-not-exist/dirshare-test-config").unwrap();
        config.logging.access_log = false;
        config.http.max_body_size = Some(1024 * 1024);
        Arc::new(AppState::with_root(&config, RootDir::new(dir).unwrap()))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        req: Request<Full<Bytes>>,
    ) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let response = handle_request(req, Arc::clone(state), peer()).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    fn get(uri: &str) -> Request<Full<Bytes>> {
        Request::get(uri).body(Full::new(Bytes::new())).unwrap()
    }

    fn upload(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Full<Bytes>> {
        Request::post("/api/upload")
            .header("Content-Type", form::content_type())
            .body(Full::new(Bytes::from(form::encode(parts))))
            .unwrap()
    }

    fn json(body: &Bytes) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[test]
    fn test_route_table() {
        assert_eq!(Route::from_path("/"), Some(Route::Index));
        assert_eq!(Route::from_path("/api/files"), Some(Route::ListFiles));
        assert_eq!(Route::from_path("/api/files/"), None);
        assert!(Route::Upload.accepts(&Method::POST));
        assert!(!Route::Upload.accepts(&Method::GET));
        assert!(Route::Download.accepts(&Method::HEAD));
        assert!(!Route::ListFiles.accepts(&Method::DELETE));
    }

    #[tokio::test]
    async fn test_upload_list_download_flow() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let (status, _, body) = send(&state, upload(&[("file", Some("a.txt"), b"hello")])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json(&body),
            serde_json::json!({ "success": true, "filenames": ["a.txt"] })
        );

        let (status, headers, body) = send(&state, get("/api/files?path=")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["Server"], "dirshare");
        let listing = json(&body);
        assert_eq!(listing["current_path"], "");
        assert_eq!(
            listing["files"],
            serde_json::json!([{ "name": "a.txt", "is_dir": false, "path": "a.txt", "size": 5 }])
        );

        let (status, headers, body) = send(&state, get("/api/download?path=a.txt")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["Content-Disposition"], "attachment; filename=\"a.txt\"");
        assert_eq!(headers["Content-Type"], "text/plain; charset=utf-8");
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden_without_leaking_paths() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        for uri in [
            "/api/files?path=..%2Fsecret",
            "/api/files?path=%2Fetc%2Fpasswd",
            "/api/download?path=a%2F..%2F..%2Fb",
            "/api/download?path=..%2F..%2F..%2Fetc%2Fpasswd",
        ] {
            let (status, _, body) = send(&state, get(uri)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(json(&body), serde_json::json!({ "error": "Access denied" }));
        }
    }

    #[tokio::test]
    async fn test_missing_paths_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let state = state_for(dir.path());

        for uri in [
            "/api/files?path=nope",
            "/api/download?path=nope.txt",
            "/api/download?path=sub",
            "/api/download",
        ] {
            let (status, _, body) = send(&state, get(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(json(&body), serde_json::json!({ "error": "Path not found" }));
        }
    }

    #[tokio::test]
    async fn test_root_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.bin"), [1u8, 2, 3]).unwrap();
        let state = state_for(dir.path());

        let (status, _, body) = send(&state, get("/api/files?path=root")).await;
        assert_eq!(status, StatusCode::OK);
        let listing = json(&body);
        assert_eq!(listing["current_path"], "");
        assert_eq!(listing["files"][0]["size"], 3);
    }

    #[tokio::test]
    async fn test_entry_named_root_is_reachable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("root"), b"data").unwrap();
        std::fs::write(dir.path().join("other.txt"), b"x").unwrap();
        let state = state_for(dir.path());

        let (_, _, body) = send(&state, get("/api/files?path=")).await;
        let listing = json(&body);
        let files = listing["files"].as_array().unwrap();
        let entry = files.iter().find(|f| f["name"] == "root").unwrap();
        let path = entry["path"].as_str().unwrap().to_string();

        let (status, _, body) = send(&state, get(&format!("/api/download?path={path}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"data");

        // A directory with that name lists its own contents
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("root")).unwrap();
        std::fs::write(dir.path().join("root/inner.txt"), b"abc").unwrap();
        let state = state_for(dir.path());

        let (_, _, body) = send(&state, get("/api/files?path=")).await;
        let path = json(&body)["files"][0]["path"].as_str().unwrap().to_string();
        let (status, _, body) = send(&state, get(&format!("/api/files?path={path}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["files"][0]["path"], "root/inner.txt");
    }

    #[tokio::test]
    async fn test_head_download_reports_length_without_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.bin"), vec![9u8; 2048]).unwrap();
        let state = state_for(dir.path());

        let req = Request::head("/api/download?path=big.bin")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, headers, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["Content-Length"], "2048");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejections_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let (status, _, body) = send(&state, upload(&[("file", Some(""), b"")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"].is_string());

        let (status, _, body) = send(&state, upload(&[("note", None, b"text")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body), serde_json::json!({ "error": "No file part" }));

        let plain = Request::post("/api/upload")
            .body(Full::new(Bytes::from_static(b"raw bytes")))
            .unwrap();
        let (status, _, _) = send(&state, plain).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_traversal_name_stays_inside() {
        let outer = tempfile::tempdir().unwrap();
        let served = outer.path().join("served");
        std::fs::create_dir(&served).unwrap();
        let state = state_for(&served);

        let (status, _, body) =
            send(&state, upload(&[("file", Some("../../evil.sh"), b"echo pwned")])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["filenames"], serde_json::json!(["evil.sh"]));
        assert!(served.join("evil.sh").exists());
        assert!(!outer.path().join("evil.sh").exists());
    }

    #[tokio::test]
    async fn test_method_and_route_errors() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let (status, headers, _) = send(&state, get("/api/upload")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers["Allow"], "POST, OPTIONS");

        let delete = Request::delete("/api/files").body(Full::new(Bytes::new())).unwrap();
        let (status, _, _) = send(&state, delete).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _, body) = send(&state, get("/nowhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json(&body), serde_json::json!({ "error": "Not Found" }));

        let options = Request::options("/api/files").body(Full::new(Bytes::new())).unwrap();
        let (status, headers, _) = send(&state, options).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers["Allow"], "GET, HEAD, OPTIONS");
    }

    #[tokio::test]
    async fn test_body_size_guard() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let oversized = Request::post("/api/upload")
            .header("Content-Type", form::content_type())
            .header("Content-Length", "999999999")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let (status, _, _) = send(&state, oversized).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_landing_page_and_script() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());

        let (status, headers, body) = send(&state, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["Content-Type"], "text/html; charset=utf-8");
        assert!(std::str::from_utf8(&body).unwrap().contains("/static/script.js"));

        let (status, headers, body) = send(&state, get("/static/script.js")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["Content-Type"], "application/javascript");
        assert!(std::str::from_utf8(&body).unwrap().contains("/api/files"));

        let head = Request::head("/").body(Full::new(Bytes::new())).unwrap();
        let (status, headers, body) = send(&state, head).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(headers["Content-Length"], "0");
        assert!(body.is_empty());
    }
}
