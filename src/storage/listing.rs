//! Directory listing

use serde::Serialize;
use std::fs::Metadata;
use tokio::fs;

use super::error::FsError;
use super::root::{strip_sentinel, ResolvedPath, RootDir};

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    /// Location relative to the root, usable as the next `path` query
    pub path: String,
    /// Byte size, 0 when metadata could not be read
    pub size: u64,
}

/// Listing response body
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub files: Vec<DirEntry>,
    pub current_path: String,
}

/// List the immediate children of `requested`
///
/// A regular file yields a single-entry listing describing the file itself.
/// Entries come back in directory enumeration order.
pub async fn list_directory(root: &RootDir, requested: &str) -> Result<Listing, FsError> {
    let current_path = strip_sentinel(requested).to_string();
    let target = root.resolve(requested)?;

    let Ok(metadata) = fs::metadata(&target.absolute).await else {
        return Err(FsError::NotFound);
    };

    let files = if metadata.is_dir() {
        read_children(&target).await?
    } else {
        vec![describe_file(&target, &metadata)]
    };

    Ok(Listing {
        files,
        current_path,
    })
}

async fn read_children(target: &ResolvedPath) -> Result<Vec<DirEntry>, FsError> {
    let mut reader = fs::read_dir(&target.absolute)
        .await
        .map_err(FsError::from_io)?;

    let mut entries = Vec::new();
    while let Some(child) = reader.next_entry().await? {
        let name = child.file_name().to_string_lossy().into_owned();
        // Follows links; a dangling one shows up as a zero-sized file
        let (is_dir, size) = match fs::metadata(child.path()).await {
            Ok(m) => (m.is_dir(), m.len()),
            Err(_) => (false, 0),
        };
        entries.push(DirEntry {
            path: target.child_path(&name),
            name,
            is_dir,
            size,
        });
    }
    Ok(entries)
}

fn describe_file(target: &ResolvedPath, metadata: &Metadata) -> DirEntry {
    let name = target
        .absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    DirEntry {
        name,
        is_dir: false,
        path: target.query_path(),
        size: metadata.len(),
    }
}
