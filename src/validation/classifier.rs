//! Transport failure classification
//!
//! Maps the message of a failed request onto one of the synthetic 6xx
//! result codes. Rules are checked in table order and the first match wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::constants::result_codes;

/// Ordered `(pattern, code)` rules. Matching is case-sensitive.
pub const CLASSIFICATION_RULES: [(&str, u16); 5] = [
    ("Failed to establish a new", result_codes::UNKNOWN_HOSTNAME),
    ("Read timed out", result_codes::READ_TIMEOUT),
    ("No connection adapters", result_codes::UNSUPPORTED_PROTOCOL),
    ("No schema supplied", result_codes::ILL_FORMED_URL),
    ("Connection to .*timed out", result_codes::CONNECTION_FAILED),
];

/// Code for a failure matching no rule
pub const FALLBACK_CODE: u16 = result_codes::UNKNOWN_EXCEPTION;

static COMPILED_RULES: Lazy<Vec<(Regex, u16)>> = Lazy::new(|| {
    CLASSIFICATION_RULES
        .iter()
        .map(|(pattern, code)| {
            (
                Regex::new(pattern).expect("Failed to compile classification pattern"),
                *code,
            )
        })
        .collect()
});

/// Classify a transport failure message.
///
/// # Examples
/// ```
/// use urlchecker::validation::classifier::classify;
///
/// assert_eq!(classify("HTTPConnectionPool(host='a', port=80): Read timed out."), 605);
/// assert_eq!(classify("something else entirely"), 608);
/// ```
pub fn classify(message: &str) -> u16 {
    COMPILED_RULES
        .iter()
        .find(|(regex, _)| regex.is_match(message))
        .map(|(_, code)| *code)
        .unwrap_or(FALLBACK_CODE)
}
