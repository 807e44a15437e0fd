//! Storage module
//!
//! All filesystem access for the served root: path containment, listing,
//! downloads and uploads. Nothing here knows about HTTP.

mod error;
mod listing;
mod root;
mod sanitize;
mod transfer;

pub use error::FsError;
pub use listing::list_directory;
pub use root::RootDir;
pub use transfer::{read_download, save_uploads, stat_download, UploadedFile};
