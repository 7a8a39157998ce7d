use std::path::{Component, Path};

use time::OffsetDateTime;

use crate::errors::{Result, WikiError};

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    escape_html(text)
}

/// Create URL-friendly slug from text
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if (c.is_ascii_whitespace() || c == '-' || c == '_') && !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

/// Check that a page url names a single visible file directly under the root.
pub fn ensure_safe_url(url: &str) -> Result<()> {
    let invalid = || WikiError::InvalidPath(url.to_string());
    if url.trim().is_empty() || url.starts_with('.') || url.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(url).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

/// Last modification time of a file, formatted as RFC 3339
pub fn last_modified(path: &Path) -> Option<String> {
    let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let secs = mtime.duration_since(std::time::UNIX_EPOCH).ok()?.as_secs();
    let datetime = OffsetDateTime::from_unix_timestamp(i64::try_from(secs).ok()?).ok()?;
    datetime.format(&time::format_description::well_known::Rfc3339).ok()
}
