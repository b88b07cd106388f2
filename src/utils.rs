//! Utility functions for file operations and path-safe names

use crate::error::Result;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Characters that are not allowed in a path component on common filesystems
#[allow(clippy::expect_used)]
static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\<>:"|?*]"#).expect("static regex is valid"));

/// Replace every forbidden path character with `_`
///
/// # Examples
///
/// ```
/// use catalog_dl::utils::sanitize_component;
///
/// assert_eq!(sanitize_component("AC/DC: Live?"), "AC_DC_ Live_");
/// ```
pub fn sanitize_component(name: &str) -> String {
    FORBIDDEN_CHARS.replace_all(name, "_").into_owned()
}

/// Keep at most `max` characters (not bytes) of `text`
pub fn limit_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Whether a regular file exists at `path`
///
/// Directories do not count. Any error other than "not found" is returned.
pub async fn file_exists(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Remove a file, treating "already gone" as success
pub async fn remove_file_if_exists(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
