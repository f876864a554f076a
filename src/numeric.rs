//! Numeric extraction from display-formatted listing values.
//!
//! Listing fields arrive either as raw JSON numbers or as strings that already
//! carry presentation decoration (`"$1,250,000"`, `"12.5 ac"`). Everything
//! that sorts, bins or formats a field goes through here.

use serde_json::Value;

/// Parses a decorated string into a float.
///
/// Every character other than an ASCII digit, `.` or `-` is removed first.
/// The leftmost valid numeric prefix of what remains is parsed and anything
/// after it is ignored. Returns `NaN` when no digits survive.
pub fn parse_numeric_str(raw: &str) -> f64 {
    let stripped: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();

    let Some(prefix) = numeric_prefix(&stripped) else {
        return f64::NAN;
    };

    let normalized = match prefix.strip_prefix('-') {
        Some(rest) if rest.starts_with('.') => format!("-0{rest}"),
        _ if prefix.starts_with('.') => format!("0{prefix}"),
        _ => prefix.to_string(),
    };
    normalized.parse::<f64>().unwrap_or(f64::NAN)
}

/// Numbers pass through unchanged; strings are parsed; anything else is `NaN`.
pub fn parse_numeric(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(raw) => parse_numeric_str(raw),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Comparator key used by listing sorts: unparsable and missing become 0.
pub fn parse_numeric_or_zero(value: Option<&Value>) -> f64 {
    let parsed = value.map(parse_numeric).unwrap_or(f64::NAN);
    if parsed.is_nan() {
        0.0
    } else {
        parsed
    }
}

// Longest prefix shaped like `-?\d*(\.\d*)?` that contains at least one digit.
fn numeric_prefix(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        let mut frac_digits = 0;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            frac_digits += 1;
        }
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        None
    } else {
        Some(input[..end].trim_end_matches('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_currency_and_thousands_separators() {
        assert_eq!(parse_numeric_str("$1,250,000"), 1_250_000.0);
        assert_eq!(parse_numeric_str("$12,345.67"), 12_345.67);
        assert_eq!(parse_numeric_str("12.5 ac"), 12.5);
    }

    #[test]
    fn keeps_sign_and_leading_fraction() {
        assert_eq!(parse_numeric_str("-$4,200"), -4_200.0);
        assert_eq!(parse_numeric_str(".75"), 0.75);
        assert_eq!(parse_numeric_str("-.5"), -0.5);
        assert_eq!(parse_numeric_str("7."), 7.0);
    }

    #[test]
    fn no_digits_is_nan() {
        assert!(parse_numeric_str("").is_nan());
        assert!(parse_numeric_str("N/A").is_nan());
        assert!(parse_numeric_str("$-").is_nan());
        assert!(parse_numeric_str("--5").is_nan());
    }

    #[test]
    fn trailing_garbage_after_prefix_is_ignored() {
        assert_eq!(parse_numeric_str("12-5"), 12.0);
        assert_eq!(parse_numeric_str("1.2.3"), 1.2);
        assert_eq!(parse_numeric_str("3-4 acres"), 3.0);
    }

    #[test]
    fn non_strings_are_returned_unchanged() {
        assert_eq!(parse_numeric(&json!(0.82)), 0.82);
        assert_eq!(parse_numeric(&json!(42)), 42.0);
        assert!(parse_numeric(&Value::Null).is_nan());
        assert!(parse_numeric(&json!(true)).is_nan());
    }

    #[test]
    fn parsing_is_idempotent() {
        let inputs = [
            json!("$100,000"),
            json!("0.40"),
            json!(-3.25),
            json!("-12.5%"),
            json!("1,234.5678"),
        ];

        for input in inputs {
            let once = parse_numeric(&input);
            let twice = parse_numeric(&json!(once));
            assert_eq!(once, twice, "input {input}");
        }
    }

    #[test]
    fn sort_key_defaults_to_zero() {
        assert_eq!(parse_numeric_or_zero(None), 0.0);
        assert_eq!(parse_numeric_or_zero(Some(&json!("N/A"))), 0.0);
        assert_eq!(parse_numeric_or_zero(Some(&json!("$9"))), 9.0);
    }
}
