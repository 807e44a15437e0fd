//! Query string access

use url::form_urlencoded;

/// First value of `key` in a raw query string, percent-decoded
pub fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
