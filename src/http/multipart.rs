//! `multipart/form-data` decoding for uploads

use hyper::body::Bytes;
use std::convert::Infallible;

use crate::storage::{FsError, UploadedFile};

/// Form field carrying uploaded files
pub const UPLOAD_FIELD: &str = "file";

/// Extract the file parts of an upload body
///
/// Only fields named [`UPLOAD_FIELD`] that carry a `filename` parameter count
/// as files; plain form fields are ignored. A body that is not multipart yields
/// no files at all.
pub async fn parse_upload(content_type: Option<&str>, body: Bytes) -> Result<Vec<UploadedFile>, FsError> {
    let Some(boundary) = content_type.and_then(|ct| multer::parse_boundary(ct).ok()) else {
        return Ok(Vec::new());
    };

    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(malformed)?;
        files.push(UploadedFile {
            file_name,
            data: data.to_vec(),
        });
    }
    Ok(files)
}

fn malformed(err: multer::Error) -> FsError {
    crate::logger::log_warning(&format!("Rejected multipart body: {err}"));
    FsError::bad_request("Malformed upload body")
}
