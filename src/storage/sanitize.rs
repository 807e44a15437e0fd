//! Upload file name sanitization

use unicode_normalization::UnicodeNormalization;

/// Device names Windows reserves regardless of extension
#[cfg(windows)]
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce a client-supplied file name to a single safe directory entry name
///
/// The name is NFKD-decomposed and whatever is still non-ASCII is dropped.
/// Path separators become word breaks, whitespace collapses to `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped and leading/trailing dots and
/// underscores are trimmed, so the result never contains a separator and is
/// never `.` or `..`. On Windows, device names get a leading `_`. The result
/// may be empty.
///
/// ```text
/// "../../evil.sh"      -> "evil.sh"
/// "My cool movie.mov"  -> "My_cool_movie.mov"
/// "caf\u{e9}.txt"     -> "cafe.txt"
/// ```
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');
    escape_device_name(trimmed)
}

#[cfg(windows)]
fn escape_device_name(name: &str) -> String {
    let stem = name.split('.').next().unwrap_or_default();
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        format!("_{name}")
    } else {
        name.to_string()
    }
}

#[cfg(not(windows))]
fn escape_device_name(name: &str) -> String {
    name.to_string()
}
