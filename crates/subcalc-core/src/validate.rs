//! Input screening
//!
//! Rejects raw user input containing anything outside the address alphabet
//! before it reaches the numeric pipeline. Input is never silently filtered:
//! if dropping a character would change the text, the whole value is refused.

use crate::{CalcError, Result};
use tracing::warn;

/// Separator between an address and its network specifier
pub const SEPARATOR: char = '/';

/// Check a raw value against the address alphabet
///
/// Allowed characters are `0-9`, `a-f`, `A-F`, `:` and `.`, plus `/` when
/// `allow_separator` is set. Surrounding whitespace is trimmed first.
///
/// # Examples
///
/// ```
/// use subcalc_core::validate::sanitize;
///
/// assert_eq!(sanitize(" 10.0.0.1 ", false).unwrap(), "10.0.0.1");
/// assert!(sanitize("10.0.0.1/8", false).is_err());
/// assert!(sanitize("10.0.0.1/8", true).is_ok());
/// ```
pub fn sanitize(raw: &str, allow_separator: bool) -> Result<String> {
    sanitize_field("Input", raw, allow_separator)
}

/// Same as [`sanitize`], naming the offending field in the error
pub fn sanitize_field(field: &str, raw: &str, allow_separator: bool) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CalcError::EmptyInput(field.to_string()));
    }

    let filtered: String = trimmed
        .chars()
        .filter(|&c| is_allowed(c, allow_separator))
        .collect();

    if filtered != trimmed {
        warn!(field = %field, "rejected input with invalid characters");
        return Err(CalcError::InvalidCharacters(field.to_string()));
    }

    Ok(filtered)
}

fn is_allowed(c: char, allow_separator: bool) -> bool {
    c.is_ascii_hexdigit() || c == ':' || c == '.' || (allow_separator && c == SEPARATOR)
}
