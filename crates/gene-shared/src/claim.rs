//! Checkable claims and their sanitization.
//!
//! A claim is passed verbatim into a verification prompt, so it is restricted
//! to ASCII letters, digits and `, . ; ? ! * ( ) _ -`. A claim that ends in a
//! run of anything else has that run replaced with a single `_`; everything
//! before the run is kept untouched.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Replacement for a disallowed run.
pub const PLACEHOLDER: char = '_';

static ALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9,.;?!*()_-]+$").unwrap());

static TRAILING_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9,.;?!*()_-]+$").unwrap());

static PROMPT_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").unwrap());

/// True when every character of `text` is in the allowed class.
pub fn is_allowed(text: &str) -> bool {
    ALLOWED.is_match(text)
}

/// Replace a trailing run of disallowed characters with one placeholder.
pub fn sanitize(raw: &str) -> String {
    if is_allowed(raw) {
        return raw.to_string();
    }
    TRAILING_DISALLOWED
        .replace(raw, PLACEHOLDER.to_string().as_str())
        .into_owned()
}

/// Collapse every run outside `[A-Za-z0-9_-]` into a placeholder.
///
/// Applied to the revised narrative before it is embedded in the second
/// extraction prompt. Text already in the allowed claim class is returned
/// unchanged.
pub fn flatten_for_prompt(text: &str) -> String {
    if is_allowed(text) {
        return text.to_string();
    }
    PROMPT_DISALLOWED
        .replace_all(text, PLACEHOLDER.to_string().as_str())
        .into_owned()
}

/// A claim as extracted, plus the form sent to verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub raw: String,
    pub sanitized: String,
}

impl Claim {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let sanitized = sanitize(&raw);
        Self { raw, sanitized }
    }

    pub fn was_rewritten(&self) -> bool {
        self.raw != self.sanitized
    }
}

impl std::fmt::Display for Claim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sanitized)
    }
}
