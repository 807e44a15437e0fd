//! Request handler module
//!
//! Routes requests to the file API endpoints and the embedded landing page.

pub mod api;
pub mod pages;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
