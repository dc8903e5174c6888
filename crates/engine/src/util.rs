//! Internal helpers for input normalization and generated identifiers.
//!
//! These utilities are **not** part of the public API.

use crate::{EngineError, ResultEngine};

/// Prefix of client codes minted by the engine.
pub(crate) const CLIENT_CODE_PREFIX: &str = "tmpc-";
/// Prefix of material codes minted by the engine.
pub(crate) const MATERIAL_CODE_PREFIX: &str = "tmpm-";

const CLIENT_CODE_WIDTH: usize = 6;
const MATERIAL_CODE_WIDTH: usize = 5;

/// Trim a required text field, rejecting blanks.
pub(crate) fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Import cells that mean "no value".
pub(crate) fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("none")
}

/// Like [`is_placeholder`], plus the "not available" markers used for codes.
pub(crate) fn is_code_placeholder(value: &str) -> bool {
    is_placeholder(value) || value.trim().eq_ignore_ascii_case("n/a")
}

/// Drop a leading `#` so `#1042` and `1042` address the same bill.
pub(crate) fn strip_bill_prefix(bill_no: &str) -> &str {
    let trimmed = bill_no.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed)
}

pub(crate) fn format_bill_number(count: i64) -> String {
    format!("#{count}")
}

/// Next code in a generated sequence given the highest code issued so far.
///
/// Codes that do not carry a numeric suffix restart the sequence at 1.
pub(crate) fn next_generated_code(last: Option<&str>, prefix: &str, width: usize) -> String {
    let next = last
        .and_then(|code| code.strip_prefix(prefix))
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .map_or(1, |n| n + 1);
    format!("{prefix}{next:0width$}")
}

pub(crate) fn next_client_code(last: Option<&str>) -> String {
    next_generated_code(last, CLIENT_CODE_PREFIX, CLIENT_CODE_WIDTH)
}

pub(crate) fn next_material_code(last: Option<&str>) -> String {
    next_generated_code(last, MATERIAL_CODE_PREFIX, MATERIAL_CODE_WIDTH)
}

/// Quantities are compared with a small tolerance since they are stored as
/// doubles.
pub(crate) fn qty_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_zero_padded_and_increment() {
        assert_eq!(next_client_code(None), "tmpc-000001");
        assert_eq!(next_client_code(Some("tmpc-000041")), "tmpc-000042");
        assert_eq!(next_material_code(None), "tmpm-00001");
        assert_eq!(next_material_code(Some("tmpm-00009")), "tmpm-00010");
    }

    #[test]
    fn unparsable_codes_restart_the_sequence() {
        assert_eq!(next_client_code(Some("tmpc-abc")), "tmpc-000001");
        assert_eq!(next_client_code(Some("C-7")), "tmpc-000001");
    }

    #[test]
    fn placeholders_are_detected() {
        assert!(is_placeholder("  "));
        assert!(is_placeholder("NaN"));
        assert!(is_placeholder("None"));
        assert!(!is_placeholder("N/A"));
        assert!(is_code_placeholder("n/a"));
        assert!(!is_code_placeholder("C-1"));
    }

    #[test]
    fn bill_prefix_is_optional() {
        assert_eq!(strip_bill_prefix("#1042"), "1042");
        assert_eq!(strip_bill_prefix(" 1042 "), "1042");
        assert_eq!(format_bill_number(1042), "#1042");
    }

    #[test]
    fn normalize_required_rejects_blank() {
        assert_eq!(normalize_required("  Acme ", "client name").unwrap(), "Acme");
        assert!(normalize_required("   ", "client name").is_err());
    }
}
