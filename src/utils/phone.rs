// src/utils/phone.rs

//! North American phone number normalization.

use std::sync::LazyLock;

use regex::Regex;

/// Phone-shaped text: optional `+1`, area code with optional parentheses,
/// space/hyphen/dot separators, optional extension. Digit and space classes
/// are ASCII-only.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i-u)(?:\+?1[\s\-.]?)?(?:\(\s*\d{3}\s*\)|\d{3})[\s\-.]?\d{3}[\s\-.]?\d{4}(?:\s*(?:x|ext\.?)\s*\d{1,6})?",
    )
    .expect("phone pattern is valid")
});

/// Normalize free text to the canonical `XXX-XXX-XXXX` form.
///
/// The canonical form doubles as the dedup key. Only 10-digit numbers
/// (or 11 digits with a leading `1`) are accepted.
///
/// # Examples
/// ```
/// use silverfish::utils::phone::normalize_phone;
///
/// assert_eq!(normalize_phone("+1 (949) 555-1212"), Some("949-555-1212".to_string()));
/// assert_eq!(normalize_phone("555-1212"), None);
/// ```
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = match digits.strip_prefix('1') {
        Some(rest) if digits.len() == 11 => rest,
        _ => digits.as_str(),
    };

    if digits.len() != 10 || digits == "0000000000" {
        return None;
    }

    Some(format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..]))
}

/// Find every phone-shaped fragment in a block of text.
pub fn find_phone_candidates(text: &str) -> impl Iterator<Item = &str> {
    PHONE_PATTERN.find_iter(text).map(|m| m.as_str())
}
