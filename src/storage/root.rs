//! Served root directory and path containment
//!
//! Every client-supplied path goes through [`RootDir::resolve`] before the
//! filesystem is touched. Resolution is purely lexical: the request is joined
//! onto the root, `.` and `..` are folded, and the result must still sit at or
//! below the root. Symbolic links are not followed here.

use std::path::{Component, Path, PathBuf};

use super::error::FsError;
use crate::logger;

/// Query value meaning "the root itself"
pub const ROOT_SENTINEL: &str = "root";

/// Absolute, canonical directory all operations are confined to
#[derive(Debug, Clone)]
pub struct RootDir {
    path: PathBuf,
}

/// A request path that passed the containment check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute location on disk
    pub absolute: PathBuf,
    /// '/'-separated location relative to the root, empty for the root itself
    pub relative: String,
}

impl RootDir {
    /// Canonicalize `path` and make sure it is a directory
    pub fn new(path: impl AsRef<Path>) -> Result<Self, FsError> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(FsError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("served root is not a directory: {}", path.display()),
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a client-supplied relative path against the root
    pub fn resolve(&self, requested: &str) -> Result<ResolvedPath, FsError> {
        let requested = strip_sentinel(requested);
        let normalized = normalize(&self.path.join(requested));

        let Ok(rest) = normalized.strip_prefix(&self.path) else {
            logger::log_warning(&format!("Path traversal attempt blocked: {requested:?}"));
            return Err(FsError::AccessDenied);
        };

        let relative = rest
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");

        Ok(ResolvedPath {
            absolute: normalized,
            relative,
        })
    }
}

impl ResolvedPath {
    /// Relative path of a direct child of this location
    pub fn child_path(&self, name: &str) -> String {
        if self.relative.is_empty() {
            escape_sentinel(name.to_string())
        } else {
            format!("{}/{name}", self.relative)
        }
    }

    /// This location in a form that resolves back to it
    pub fn query_path(&self) -> String {
        escape_sentinel(self.relative.clone())
    }
}

/// An entry literally named "root" must not read back as the root itself
fn escape_sentinel(relative: String) -> String {
    if relative == ROOT_SENTINEL {
        format!("./{relative}")
    } else {
        relative
    }
}

/// Treat the "root" sentinel as the empty path
pub fn strip_sentinel(requested: &str) -> &str {
    if requested == ROOT_SENTINEL {
        ""
    } else {
        requested
    }
}

/// Lexically fold `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
