//! Defanged URL handling.
//!
//! Reported URLs are stored with their scheme altered (`hxxps://` instead of
//! `https://`) so nobody navigates to a phishing page by accident. Raw
//! `http://` and `https://` are rejected at submission time.

/// Scheme prefixes accepted for `url` reports.
pub const DEFANGED_PREFIXES: [&str; 2] = ["hxxp://", "hxxps://"];

/// Whether `content` starts with a defanged scheme. Case-sensitive.
pub fn is_defanged(content: &str) -> bool {
  DEFANGED_PREFIXES.iter().any(|p| content.starts_with(p))
}
