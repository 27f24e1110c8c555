//! Decimal digit analysis for floating-point columns.

/// Digits needed to print a set of numbers without losing precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitCount {
    /// Fractional digits, or -1 when some value needs more than the maximum.
    pub mantissa: i32,
    /// Digits before the decimal point.
    pub integer: i32,
}

/// Smallest number of fractional digits `i < max_digits` such that `v`
/// rounded to `i` digits stays within `delta` of `v`; -1 if none does.
pub fn mantissa_digit_count(v: f64, max_digits: i32, delta: f64) -> i32 {
    let mut m = 1.0;
    for i in 0..max_digits {
        let rounded = (v * m).round() / m;
        if (rounded - v).abs() <= delta {
            return i;
        }
        m *= 10.0;
    }
    -1
}

/// Digits before the decimal point, 0 for values within `delta` of zero.
pub fn integer_digit_count(v: f64, delta: f64) -> i32 {
    let abs = v.abs();
    if abs > delta {
        abs.log10().floor() as i32 + 1
    } else {
        0
    }
}

/// Maximum mantissa and integer digit counts over `xs`.
pub fn array_digit_count(xs: &[f64], max_digits: i32, delta: f64) -> DigitCount {
    let mut mantissa = 0;
    let mut integer = 0;
    for &x in xs {
        if mantissa >= 0 {
            let t = mantissa_digit_count(x, max_digits, delta);
            if t < 0 {
                mantissa = -1;
            } else if t > mantissa {
                mantissa = t;
            }
        }
        integer = integer.max(integer_digit_count(x, delta));
    }
    DigitCount { mantissa, integer }
}

/// Lexical class of a numeric-looking token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberType {
    Int,
    Float,
    Scientific,
    NaN,
}

fn skip_digits(b: &[u8], mut i: usize) -> usize {
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    i
}

/// Classify `s` as an integer, a plain decimal, a number in exponent
/// notation, or not a number at all.
pub fn number_type(s: &str) -> NumberType {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'-' | b'+')) {
        i += 1;
    }

    let int_end = skip_digits(b, i);
    let has_int = int_end > i;
    i = int_end;
    if i == b.len() {
        return if has_int { NumberType::Int } else { NumberType::NaN };
    }

    if b[i] == b'.' {
        let frac_end = skip_digits(b, i + 1);
        if !has_int && frac_end == i + 1 {
            return NumberType::NaN;
        }
        i = frac_end;
        if i == b.len() {
            return NumberType::Float;
        }
    } else if !has_int {
        return NumberType::NaN;
    }

    if b[i] == b'e' || b[i] == b'E' {
        i += 1;
        if matches!(b.get(i), Some(b'-' | b'+')) {
            i += 1;
        }
        let exp_end = skip_digits(b, i);
        if exp_end > i && exp_end == b.len() {
            return NumberType::Scientific;
        }
    }
    NumberType::NaN
}

/// Parse the leading integer of `s` (optional sign then digits), 0 if none.
pub fn parse_int_prefix(s: &str) -> i64 {
    let b = s.as_bytes();
    let start = usize::from(matches!(b.first(), Some(b'-' | b'+')));
    let end = skip_digits(b, start);
    s[..end].parse().unwrap_or(0)
}

/// Parse a float, ignoring a trailing standard uncertainty such as `(4)`.
/// Unparseable values give 0.
pub fn parse_float_lenient(s: &str) -> f64 {
    let s = match s.find('(') {
        Some(idx) => &s[..idx],
        None => s,
    };
    s.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mantissa_digits() {
        assert_eq!(mantissa_digit_count(1.0, 4, 1e-6), 0);
        assert_eq!(mantissa_digit_count(1.25, 4, 1e-6), 2);
        assert_eq!(mantissa_digit_count(0.123456, 4, 1e-6), -1);
    }

    #[test]
    fn integer_digits() {
        assert_eq!(integer_digit_count(0.0, 1e-6), 0);
        assert_eq!(integer_digit_count(9.5, 1e-6), 1);
        assert_eq!(integer_digit_count(-123.4, 1e-6), 3);
    }

    #[test]
    fn number_types() {
        assert_eq!(number_type("42"), NumberType::Int);
        assert_eq!(number_type("-7"), NumberType::Int);
        assert_eq!(number_type("1.5"), NumberType::Float);
        assert_eq!(number_type("1."), NumberType::Float);
        assert_eq!(number_type(".5"), NumberType::Float);
        assert_eq!(number_type("1e5"), NumberType::Scientific);
        assert_eq!(number_type("1.2E-3"), NumberType::Scientific);
        assert_eq!(number_type("ALA"), NumberType::NaN);
        assert_eq!(number_type("1A"), NumberType::NaN);
        assert_eq!(number_type("-"), NumberType::NaN);
        assert_eq!(number_type("."), NumberType::NaN);
    }

    #[test]
    fn lenient_parsing() {
        assert_eq!(parse_int_prefix("12A"), 12);
        assert_eq!(parse_int_prefix("-3"), -3);
        assert_eq!(parse_int_prefix("x"), 0);
        assert_eq!(parse_float_lenient("50.123(4)"), 50.123);
        assert_eq!(parse_float_lenient("?"), 0.0);
    }

    #[test]
    fn array_counts() {
        let c = array_digit_count(&[1.5, 22.25, 3.0], 4, 1e-6);
        assert_eq!(c, DigitCount { mantissa: 2, integer: 2 });

        let c = array_digit_count(&[1.0, 2.0], 4, 1e-6);
        assert_eq!(c.mantissa, 0);

        let c = array_digit_count(&[1.0, 1.0 / 3.0], 4, 1e-6);
        assert_eq!(c.mantissa, -1);
    }
}
