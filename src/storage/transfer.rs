//! File download and upload

use std::path::PathBuf;
use tokio::fs;

use super::error::FsError;
use super::root::RootDir;
use super::sanitize::secure_filename;
use crate::logger;

pub const NO_FILE_PART: &str = "No file part";
pub const NO_SELECTED_FILE: &str = "No selected file";

/// File contents ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    /// Length in bytes, also known when `data` was not read
    pub size: u64,
    pub data: Vec<u8>,
}

/// One file part received in an upload request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as sent by the client, unsanitized
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Read a regular file under the root
pub async fn read_download(root: &RootDir, requested: &str) -> Result<Download, FsError> {
    let (path, mut download) = locate_download(root, requested).await?;
    download.data = fs::read(&path).await.map_err(FsError::from_io)?;
    download.size = download.data.len() as u64;
    Ok(download)
}

/// Look up a downloadable file without reading its contents
pub async fn stat_download(root: &RootDir, requested: &str) -> Result<Download, FsError> {
    locate_download(root, requested).await.map(|(_, download)| download)
}

async fn locate_download(root: &RootDir, requested: &str) -> Result<(PathBuf, Download), FsError> {
    let target = root.resolve(requested)?;

    let size = match fs::metadata(&target.absolute).await {
        Ok(m) if m.is_file() => m.len(),
        _ => return Err(FsError::NotFound),
    };

    let file_name = target
        .absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let download = Download {
        file_name,
        size,
        data: Vec::new(),
    };
    Ok((target.absolute, download))
}

/// Write uploaded files into the root, returning the names actually written
///
/// The first part decides whether anything was selected at all. Parts with an
/// empty client name are skipped, as are names that sanitize to nothing.
/// Existing files are overwritten.
pub async fn save_uploads(root: &RootDir, files: Vec<UploadedFile>) -> Result<Vec<String>, FsError> {
    let Some(first) = files.first() else {
        return Err(FsError::bad_request(NO_FILE_PART));
    };
    if first.file_name.is_empty() {
        return Err(FsError::bad_request(NO_SELECTED_FILE));
    }

    let mut saved = Vec::with_capacity(files.len());
    for file in files {
        if file.file_name.is_empty() {
            continue;
        }

        let name = secure_filename(&file.file_name);
        if name.is_empty() {
            logger::log_warning(&format!(
                "Skipping upload with unusable file name: {:?}",
                file.file_name
            ));
            continue;
        }

        let target = root.resolve(&name)?;
        fs::write(&target.absolute, &file.data).await?;
        logger::log_debug(&format!(
            "Stored upload {name} ({} bytes)",
            file.data.len()
        ));
        saved.push(name);
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, RootDir) {
        let outer = tempfile::tempdir().unwrap();
        let served = outer.path().join("served");
        std::fs::create_dir(&served).unwrap();
        let root = RootDir::new(&served).unwrap();
        (outer, root)
    }

    fn part(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_download_reads_bytes() {
        let (_outer, root) = setup();
        std::fs::create_dir(root.path().join("sub")).unwrap();
        std::fs::write(root.path().join("sub/b.bin"), [0u8, 1, 2, 255]).unwrap();

        let download = read_download(&root, "sub/b.bin").await.unwrap();
        assert_eq!(download.file_name, "b.bin");
        assert_eq!(download.data, vec![0u8, 1, 2, 255]);
        assert_eq!(download.size, 4);
    }

    #[tokio::test]
    async fn test_stat_download_skips_contents() {
        let (_outer, root) = setup();
        std::fs::write(root.path().join("big.bin"), vec![7u8; 4096]).unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();

        let download = stat_download(&root, "big.bin").await.unwrap();
        assert_eq!(download.file_name, "big.bin");
        assert_eq!(download.size, 4096);
        assert!(download.data.is_empty());

        assert!(matches!(stat_download(&root, "sub").await, Err(FsError::NotFound)));
        assert!(matches!(
            stat_download(&root, "../x").await,
            Err(FsError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_download_rejects_directories_and_missing() {
        let (_outer, root) = setup();
        std::fs::create_dir(root.path().join("sub")).unwrap();

        for path in ["", "root", "sub", "missing.txt"] {
            assert!(
                matches!(read_download(&root, path).await, Err(FsError::NotFound)),
                "expected NotFound for {path:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_download_rejects_escape() {
        let (outer, root) = setup();
        std::fs::write(outer.path().join("secret.txt"), b"top secret").unwrap();

        assert!(matches!(
            read_download(&root, "../secret.txt").await,
            Err(FsError::AccessDenied)
        ));
        let absolute = outer.path().join("secret.txt");
        assert!(matches!(
            read_download(&root, absolute.to_str().unwrap()).await,
            Err(FsError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_upload_writes_sanitized_names() {
        let (outer, root) = setup();
        let saved = save_uploads(
            &root,
            vec![part("../../evil.sh", b"#!/bin/sh\n"), part("My notes.txt", b"hi")],
        )
        .await
        .unwrap();

        assert_eq!(saved, vec!["evil.sh", "My_notes.txt"]);
        assert_eq!(std::fs::read(root.path().join("evil.sh")).unwrap(), b"#!/bin/sh\n");
        assert_eq!(std::fs::read(root.path().join("My_notes.txt")).unwrap(), b"hi");
        assert!(!outer.path().join("evil.sh").exists());
    }

    #[tokio::test]
    async fn test_upload_overwrites_existing() {
        let (_outer, root) = setup();
        std::fs::write(root.path().join("a.txt"), b"old contents").unwrap();

        save_uploads(&root, vec![part("a.txt", b"new")]).await.unwrap();
        assert_eq!(std::fs::read(root.path().join("a.txt")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_upload_requires_selection() {
        let (_outer, root) = setup();

        match save_uploads(&root, Vec::new()).await {
            Err(FsError::BadRequest(msg)) => assert_eq!(msg, NO_FILE_PART),
            other => panic!("unexpected result: {other:?}"),
        }
        match save_uploads(&root, vec![part("", b"data")]).await {
            Err(FsError::BadRequest(msg)) => assert_eq!(msg, NO_SELECTED_FILE),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_skips_unusable_names() {
        let (_outer, root) = setup();
        let saved = save_uploads(
            &root,
            vec![part("keep.txt", b"1"), part("", b"2"), part("../..", b"3")],
        )
        .await
        .unwrap();
        assert_eq!(saved, vec!["keep.txt"]);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }
}
