//! Argument parsing utilities.

/// Error type for parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("number out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse an option value.
///
/// Accepts decimal, `0x` hex and leading-zero octal, each optionally
/// preceded by `-`.
pub fn parse_value(s: &str) -> Result<i64> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    // from_str_radix would accept a second sign.
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ParseError::InvalidNumber(s.to_string()));
    }

    let magnitude = u64::from_str_radix(digits, radix)
        .map_err(|_| ParseError::OutOfRange(s.to_string()))?;

    if negative {
        0i64.checked_sub_unsigned(magnitude)
            .ok_or_else(|| ParseError::OutOfRange(s.to_string()))
    } else {
        i64::try_from(magnitude).map_err(|_| ParseError::OutOfRange(s.to_string()))
    }
}
