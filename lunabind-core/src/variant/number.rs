//! Number formatting and lenient parsing used by coercions

/// Significant digits used when rendering reals
const REAL_PRECISION: i32 = 6;

/// Render a real the way a default-configured C stream does (`%g`, 6 digits)
pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; the exponent can shift (9.999995 -> 1e1)
    let sci = format!("{:.*e}", (REAL_PRECISION - 1) as usize, value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= REAL_PRECISION {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (REAL_PRECISION - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Parse the longest leading integer of `text`, skipping leading whitespace
pub fn parse_integer_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    text[..end].parse().ok()
}

/// Parse the longest leading floating point number of `text`
pub fn parse_real_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let mut mantissa_digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        mantissa_digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_real_fixed() {
        assert_eq!(format_real(15.0), "15");
        assert_eq!(format_real(0.1), "0.1");
        assert_eq!(format_real(-2.5), "-2.5");
        assert_eq!(format_real(3.14159265), "3.14159");
        assert_eq!(format_real(123456.0), "123456");
        assert_eq!(format_real(0.0001), "0.0001");
    }

    #[test]
    fn test_format_real_scientific() {
        assert_eq!(format_real(1234567.0), "1.23457e+06");
        assert_eq!(format_real(0.00001), "1e-05");
        assert_eq!(format_real(1e100), "1e+100");
        assert_eq!(format_real(9999999.0), "1e+07");
    }

    #[test]
    fn test_format_real_special() {
        assert_eq!(format_real(0.0), "0");
        assert_eq!(format_real(f64::INFINITY), "inf");
        assert_eq!(format_real(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_real(f64::NAN), "nan");
    }

    #[test]
    fn test_parse_integer_prefix() {
        assert_eq!(parse_integer_prefix("42"), Some(42));
        assert_eq!(parse_integer_prefix("  -7 apples"), Some(-7));
        assert_eq!(parse_integer_prefix("12.9"), Some(12));
        assert_eq!(parse_integer_prefix("abc"), None);
        assert_eq!(parse_integer_prefix("-"), None);
        assert_eq!(parse_integer_prefix(""), None);
    }

    #[test]
    fn test_parse_real_prefix() {
        assert_eq!(parse_real_prefix("2.5"), Some(2.5));
        assert_eq!(parse_real_prefix(" .5x"), Some(0.5));
        assert_eq!(parse_real_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_real_prefix("7e"), Some(7.0));
        assert_eq!(parse_real_prefix("-3."), Some(-3.0));
        assert_eq!(parse_real_prefix("."), None);
        assert_eq!(parse_real_prefix("nope"), None);
    }
}
