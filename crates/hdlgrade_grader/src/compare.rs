//! Radix-normalized comparison of textual values.

use hdlgrade_common::{Radix, Value};

/// Parses a textual value into its integer, or `None` if it does not parse.
///
/// A `<width>'<radix>` prefix is honored; unprefixed text is binary.
pub fn normalize(text: &str) -> Option<u64> {
    Value::parse_literal(text, Radix::Binary)
        .ok()
        .map(|value| value.bits())
}

/// Returns `true` if `expected` and `actual` denote the same number.
///
/// Leading zeros and radix prefixes are ignored, so `"0010"` equals
/// `"2'b10"` and `"4'h2"`. Text that does not parse as a value is compared
/// exactly.
pub fn values_match(expected: &str, actual: &str) -> bool {
    match (normalize(expected), normalize(actual)) {
        (Some(e), Some(a)) => e == a,
        _ => expected.trim() == actual.trim(),
    }
}
