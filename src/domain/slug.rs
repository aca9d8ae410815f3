//! Two-field slug identity for blogs.
//!
//! A blog slug is a title-derived base token plus a short disambiguator key
//! built from the owner id and the creation instant. The two parts are stored
//! as separate indexed columns so lookups stay O(index) instead of pattern
//! matching over one concatenated field. The pair is practically unique but
//! not guaranteed: same-owner, same-millisecond creation collides
//! deterministically, and callers must retry with a fresh timestamp when the
//! store rejects the insert.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Trailing characters taken from the owner id and the millisecond timestamp.
const KEY_DIGITS: usize = 6;

/// Errors that can occur while deriving a slug base token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// A blog slug split into its base token and disambiguator key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BlogSlug {
    base: String,
    key: String,
}

impl BlogSlug {
    pub fn new(base: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            key: key.into(),
        }
    }

    /// Derive a slug for a blog created by `owner_id` at `at_unix_ms`.
    pub fn derive(title: &str, owner_id: Uuid, at_unix_ms: i64) -> Result<Self, SlugError> {
        Ok(Self {
            base: derive_base(title)?,
            key: disambiguator(owner_id, at_unix_ms),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for BlogSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.key)
    }
}

/// Derive the base token from a human-readable title.
///
/// Lowercases, strips characters outside word/space/hyphen, collapses runs of
/// whitespace, underscores, and hyphens into a single hyphen, and trims
/// leading/trailing hyphens.
pub fn derive_base(title: &str) -> Result<String, SlugError> {
    if title.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut base = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.chars() {
        let lowered = ch.to_ascii_lowercase();
        if lowered.is_ascii_alphanumeric() {
            if pending_separator && !base.is_empty() {
                base.push('-');
            }
            pending_separator = false;
            base.push(lowered);
        } else if lowered.is_whitespace() || lowered == '_' || lowered == '-' {
            pending_separator = true;
        }
        // Everything else is outside word/space/hyphen and is dropped
        // without acting as a separator.
    }

    if base.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: title.to_string(),
        });
    }

    Ok(base)
}

/// Build the disambiguator key: the low-order digits of the owner id joined
/// with the low-order digits of the millisecond timestamp, no separator.
pub fn disambiguator(owner_id: Uuid, at_unix_ms: i64) -> String {
    let owner = owner_id.simple().to_string();
    let owner_tail = &owner[owner.len() - KEY_DIGITS..];

    let millis = at_unix_ms.unsigned_abs().to_string();
    let millis_tail = if millis.len() > KEY_DIGITS {
        &millis[millis.len() - KEY_DIGITS..]
    } else {
        millis.as_str()
    };

    format!("{owner_tail}{millis_tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_base_strips_punctuation() {
        let base = derive_base("Hello, World!").expect("base");
        assert_eq!(base, "hello-world");
    }

    #[test]
    fn derive_base_collapses_separator_runs() {
        let base = derive_base("  rust __ async --- patterns  ").expect("base");
        assert_eq!(base, "rust-async-patterns");
    }

    #[test]
    fn derive_base_drops_symbols_without_splitting() {
        // Symbols outside word/space/hyphen vanish without becoming hyphens.
        let base = derive_base("C++ & Rust").expect("base");
        assert_eq!(base, "c-rust");
    }

    #[test]
    fn derive_base_rejects_empty_input() {
        assert_eq!(derive_base("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn derive_base_rejects_unrepresentable_input() {
        let result = derive_base("!!!");
        assert!(matches!(result, Err(SlugError::Unrepresentable { .. })));
    }

    #[test]
    fn disambiguator_uses_low_order_digits() {
        let owner = Uuid::parse_str("00000000-0000-0000-0000-0000deadbeef").expect("uuid");
        let key = disambiguator(owner, 1_700_000_123_456);
        assert_eq!(key, "adbeef123456");
    }

    #[test]
    fn same_owner_same_millisecond_collides() {
        let owner = Uuid::new_v4();
        let first = BlogSlug::derive("My Post", owner, 1_700_000_000_000).expect("slug");
        let second = BlogSlug::derive("My Post", owner, 1_700_000_000_000).expect("slug");
        assert_eq!(first, second);

        let later = BlogSlug::derive("My Post", owner, 1_700_000_000_001).expect("slug");
        assert_ne!(first, later);
    }

    #[test]
    fn display_joins_base_and_key_with_hyphen() {
        let slug = BlogSlug::new("my-post", "adbeef123456");
        assert_eq!(slug.to_string(), "my-post-adbeef123456");
    }
}
