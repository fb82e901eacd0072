//! Phone number utilities
//!
//! Numbers are canonicalised to E.164 (`+<country><subscriber>`) before they
//! are used as identities, rate-limit keys or SMS destinations.

use once_cell::sync::Lazy;
use regex::Regex;

static E164_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").unwrap());

/// Strip formatting characters, keeping digits and a leading `+`
pub fn strip_formatting(phone: &str) -> String {
    let trimmed = phone.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() || (c == '+' && i == 0) {
            out.push(c);
        }
    }
    out
}

/// Normalize a phone number to E.164
///
/// - `+61 412 345 678` stays international
/// - `0061412345678` has the `00` trunk replaced by `+`
/// - `0412 345 678` drops the national `0` and gains `default_country_code`
/// - bare digits are prefixed with `default_country_code`
///
/// Returns `None` when the result does not match the E.164 pattern.
pub fn normalize_phone_number(phone: &str, default_country_code: &str) -> Option<String> {
    let stripped = strip_formatting(phone);
    let country = default_country_code.trim_start_matches('+');

    let canonical = if stripped.starts_with('+') {
        stripped
    } else if let Some(rest) = stripped.strip_prefix("00") {
        format!("+{}", rest)
    } else if let Some(rest) = stripped.strip_prefix('0') {
        format!("+{}{}", country, rest)
    } else if stripped.is_empty() {
        return None;
    } else {
        format!("+{}{}", country, stripped)
    };

    is_valid_e164(&canonical).then_some(canonical)
}

/// Check an already-normalized number against the E.164 pattern
pub fn is_valid_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Mask a phone number for logs, e.g. `+61****5678`
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() < 7 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
