//! HTTP protocol layer module
//!
//! Response builders, header values and request body decoding, kept apart
//! from the endpoint logic in `handler`.

pub mod disposition;
pub mod mime;
pub mod multipart;
pub mod query;
pub mod response;

// Re-export commonly used items
pub use query::query_param;
pub use response::{
    build_404_response, build_405_response, build_413_response, build_attachment_response,
    build_error_response, build_json_response, build_options_response, build_text_response,
};
