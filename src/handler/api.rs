//! File API endpoints
//!
//! Each handler takes typed request values, calls into `storage`, and turns
//! the outcome into a response. Error bodies never carry filesystem detail.

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::path::Path;

use crate::config::AppState;
use crate::http::{self, disposition, mime, multipart};
use crate::logger;
use crate::storage::{self, FsError};

/// Upload response body
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filenames: Vec<String>,
}

/// `GET /api/files?path=`
pub async fn list_files(state: &AppState, query: Option<&str>, is_head: bool) -> Response<Full<Bytes>> {
    let path = http::query_param(query, "path").unwrap_or_default();
    match storage::list_directory(&state.root, &path).await {
        Ok(listing) => http::build_json_response(StatusCode::OK, &listing, is_head),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/download?path=`
pub async fn download_file(state: &AppState, query: Option<&str>, is_head: bool) -> Response<Full<Bytes>> {
    let path = http::query_param(query, "path").unwrap_or_default();
    let result = if is_head {
        storage::stat_download(&state.root, &path).await
    } else {
        storage::read_download(&state.root, &path).await
    };
    match result {
        Ok(download) => {
            let content_type = mime::content_type_for(Path::new(&download.file_name));
            let disposition = disposition::attachment(&download.file_name);
            http::build_attachment_response(download.data, download.size, content_type, &disposition)
        }
        Err(e) => error_response(&e),
    }
}

/// `POST /api/upload` with `multipart/form-data`
pub async fn upload_files<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_warning(&format!("Failed to read upload body: {e}"));
            return error_response(&FsError::bad_request("Failed to read request body"));
        }
    };

    let result = match multipart::parse_upload(content_type.as_deref(), body).await {
        Ok(files) => storage::save_uploads(&state.root, files).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(filenames) => {
            logger::log_info(&format!("[Upload] Stored {}", filenames.join(", ")));
            http::build_json_response(
                StatusCode::OK,
                &UploadResponse {
                    success: true,
                    filenames,
                },
                false,
            )
        }
        Err(e) => error_response(&e),
    }
}

/// Map a storage failure onto status and client-facing message
pub fn error_response(err: &FsError) -> Response<Full<Bytes>> {
    let (status, message) = match err {
        FsError::AccessDenied => (StatusCode::FORBIDDEN, "Access denied"),
        FsError::NotFound => (StatusCode::NOT_FOUND, "Path not found"),
        FsError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.as_str()),
        FsError::Io(e) => {
            logger::log_error(&format!("Filesystem error: {e}"));
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    };
    http::build_error_response(status, message)
}
