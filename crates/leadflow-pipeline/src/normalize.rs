// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical forms for contact values.
//!
//! Normalized values are what duplicate detection and selection matching
//! compare; raw values are kept alongside for display.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Trims and lowercases an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Single `@` with non-empty local and domain parts, domain containing a dot.
pub fn is_valid_email(normalized: &str) -> bool {
    EMAIL_RE.is_match(normalized)
}

/// Keeps only ASCII digits. An empty result means "no phone".
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Substring before `@`, or empty when there is no `@`.
pub fn email_local_part(normalized: &str) -> &str {
    normalized.split_once('@').map_or("", |(local, _)| local)
}

/// Trims every value, drops empties and drops repeats whose `key` was
/// already seen, preserving first-seen order.
pub fn dedup_by<F>(values: &[String], key: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(key(v)))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Jane@X.com "), "jane@x.com");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn email_validity() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email("a@@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("+1 (555) 010-99"), "155501099");
        assert_eq!(normalize_phone("call me"), "");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn local_part() {
        assert_eq!(email_local_part("jane@x.com"), "jane");
        assert_eq!(email_local_part("nope"), "");
    }

    #[test]
    fn dedup_is_case_and_whitespace_insensitive() {
        let raw = vec![
            "A@x.com".to_string(),
            " a@X.com ".to_string(),
            "".to_string(),
            "b@x.com".to_string(),
        ];
        assert_eq!(dedup_by(&raw, normalize_email), vec!["A@x.com", "b@x.com"]);
    }

    proptest! {
        #[test]
        fn email_normalization_is_idempotent(raw in ".{0,40}") {
            let once = normalize_email(&raw);
            prop_assert_eq!(normalize_email(&once), once);
        }

        #[test]
        fn phone_normalization_yields_digits_only(raw in ".{0,40}") {
            let normalized = normalize_phone(&raw);
            prop_assert!(normalized.chars().all(|c| c.is_ascii_digit()));
            prop_assert_eq!(normalize_phone(&normalized), normalized.clone());
        }
    }
}
