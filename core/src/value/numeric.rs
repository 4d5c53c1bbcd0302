//! Decimal strings (DS) and integer strings (IS).
//!
//! A component which cannot be parsed does not fail the whole value:
//! it is marked with `NaN` (DS) or `i32::MIN` (IS) instead.

/// The marker for an unparseable integer string component.
pub const IS_UNPARSEABLE: i32 = i32::MIN;

/// The maximum length of a decimal string component.
pub const DS_MAX_LENGTH: usize = 16;

/// Parse one decimal string component, `None` if not a number.
pub fn parse_ds(text: &str) -> Option<f64> {
    let text = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if text.is_empty() || !text.bytes().all(|c| c.is_ascii_digit() || b"+-.eE".contains(&c)) {
        return None;
    }
    text.parse().ok()
}

/// Parse one integer string component, `None` if not an integer.
pub fn parse_is(text: &str) -> Option<i64> {
    let text = text.trim_matches(|c: char| c == ' ' || c == '\0');
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

/// Parse all components of a decimal string, marking failures with `NaN`.
pub fn parse_ds_values<'a, I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(|v| parse_ds(v).unwrap_or(f64::NAN))
        .collect()
}

/// Parse all components of an integer string,
/// marking failures and out of range values with `i32::MIN`.
pub fn parse_is_values<'a, I>(values: I) -> Vec<i32>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(|v| {
            parse_is(v)
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(IS_UNPARSEABLE)
        })
        .collect()
}

/// Format a number as a decimal string of at most 16 characters,
/// trading precision for length when needed.
pub fn format_ds(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let plain = format!("{}", value);
    if plain.len() <= DS_MAX_LENGTH || !value.is_finite() {
        return plain;
    }
    // fixed notation with fewer fraction digits, when the magnitude allows
    if value.abs() >= 1e-4 && value.abs() < 1e15 {
        let int_digits = format!("{}", value.abs().trunc() as i64).len();
        let sign = usize::from(value < 0.0);
        let digits = DS_MAX_LENGTH.saturating_sub(int_digits + sign + 1);
        if digits > 0 {
            let fixed = format!("{:.*}", digits, value);
            let fixed = trim_fraction_zeros(&fixed);
            if fixed.len() <= DS_MAX_LENGTH {
                return fixed;
            }
        }
    }
    for precision in (0..=15).rev() {
        let sci = format!("{:.*e}", precision, value);
        let sci = match sci.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", trim_fraction_zeros(mantissa), exp),
            None => sci,
        };
        if sci.len() <= DS_MAX_LENGTH {
            return sci;
        }
    }
    plain
}

fn trim_fraction_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        s.to_owned()
    }
}

/// Format an integer as an integer string.
pub fn format_is(value: i64) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_decimal_strings() {
        let values = parse_ds_values(["3.14", " -2.5 ", "1e3", "+7"]);
        assert_eq!(values, vec![3.14, -2.5, 1000.0, 7.0]);
        let values = parse_ds_values(["1", "abc"]);
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(parse_ds("inf"), None);
    }

    #[test]
    fn parse_integer_strings() {
        let values = parse_is_values(["1", "abc", " -3", "99999999999"]);
        assert_eq!(values, vec![1, IS_UNPARSEABLE, -3, IS_UNPARSEABLE]);
        assert_eq!(parse_is("+42"), Some(42));
    }

    #[rstest]
    #[case(3.14, "3.14")]
    #[case(-2.5, "-2.5")]
    #[case(100.0, "100")]
    #[case(0.1 + 0.2, "0.3")]
    #[case(1.0 / 3.0, "0.33333333333333")]
    #[case(-1.0 / 3.0, "-0.3333333333333")]
    #[case(1.5e-10, "0.00000000015")]
    #[case(1.234567890123e-12, "1.2345678901e-12")]
    #[case(6.02214076e23, "6.02214076e23")]
    fn format_decimal_strings(#[case] value: f64, #[case] expected: &str) {
        let formatted = format_ds(value);
        assert!(formatted.len() <= DS_MAX_LENGTH);
        assert_eq!(formatted, expected);
    }
}
