//! `Content-Disposition` header values

use std::fmt::Write;

/// `attachment` disposition carrying the original file name
///
/// The quoted `filename` is an ASCII fallback; `filename*` carries the exact
/// UTF-8 name (RFC 6266 / RFC 5987).
pub fn attachment(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == file_name {
        format!("attachment; filename=\"{file_name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            encode_ext_value(file_name)
        )
    }
}

/// Percent-encode everything outside RFC 5987 `attr-char`
fn encode_ext_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
