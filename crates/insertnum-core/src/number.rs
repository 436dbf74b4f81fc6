//! Number parsing and stringification with JavaScript semantics.
//!
//! Templates are rendered the way a browser's `Number` would print them, so
//! `parseInt`, `parseFloat`, `Number#toString`, `toFixed`, `toExponential` and
//! `toPrecision` are reproduced here on top of `f64`.

use once_cell::sync::Lazy;
use regex::Regex;

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)").expect("float prefix grammar")
});

static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)$").expect("decimal literal grammar")
});

/// `parseInt(s, 10)`: optional sign and the leading run of decimal digits, `NaN` when there are none.
pub fn parse_int(s: &str) -> f64 {
    let (negative, unsigned) = split_sign(s.trim_start());
    signed(negative, leading_digits(unsigned, 10))
}

/// `parseInt(s)` with no radix: like [`parse_int`], but a `0x` prefix switches to hex.
pub fn parse_int_auto(s: &str) -> f64 {
    let (negative, unsigned) = split_sign(s.trim_start());
    let magnitude = match unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        Some(hex) => leading_digits(hex, 16),
        None => leading_digits(unsigned, 10),
    };
    signed(negative, magnitude)
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

fn leading_digits(s: &str, radix: u32) -> f64 {
    let end = s.find(|c: char| !c.is_digit(radix)).unwrap_or(s.len());
    parse_radix_digits(&s[..end], radix)
}

fn signed(negative: bool, magnitude: f64) -> f64 {
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// `parseFloat(s)`: the longest decimal-literal prefix, `NaN` when there is none.
pub fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    match FLOAT_PREFIX.find(s) {
        Some(m) => parse_literal(m.as_str()),
        None => f64::NAN,
    }
}

/// `Number(s)` for a string: blank is zero, radix prefixes are honoured, trailing junk is `NaN`.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return parse_radix_digits(digits, radix);
        }
    }
    if DECIMAL_LITERAL.is_match(s) {
        parse_literal(s)
    } else {
        f64::NAN
    }
}

fn parse_literal(lit: &str) -> f64 {
    match lit.trim_start_matches('+') {
        "Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        other => other.parse::<f64>().unwrap_or(f64::NAN),
    }
}

fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut acc = 0.0;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => acc = acc * radix as f64 + d as f64,
            None => return f64::NAN,
        }
    }
    acc
}

/// `ToUint32`, used by the `u` conversion.
pub fn to_uint32(x: f64) -> f64 {
    wrap_unsigned(x, 4_294_967_296.0)
}

/// `ToUint16`, used by the `c` conversion (`String.fromCharCode`).
pub fn to_uint16(x: f64) -> f64 {
    wrap_unsigned(x, 65_536.0)
}

fn wrap_unsigned(x: f64, modulus: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    x.trunc().rem_euclid(modulus)
}

/// `Number#toString()`: shortest round-trip digits, exponent form outside `[1e-7, 1e21)`.
pub fn to_js_string(x: f64) -> String {
    if let Some(special) = non_finite(x) {
        return special;
    }
    if x == 0.0 {
        return "0".to_string();
    }
    let (digits, point) = shortest_digits(x.abs());
    let k = digits.len() as i32;
    let n = point;
    let mut out = String::new();
    if x < 0.0 {
        out.push('-');
    }
    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.push_str(&"0".repeat((n - k) as usize));
    } else if 0 < n && n <= 21 {
        out.push_str(&digits[..n as usize]);
        out.push('.');
        out.push_str(&digits[n as usize..]);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-n) as usize));
        out.push_str(&digits);
    } else {
        out.push_str(&digits[..1]);
        if k > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push_str(&exponent_suffix(n - 1));
    }
    out
}

/// Decimal digits of `x` (no leading zeros) and the position of the decimal point,
/// so that `x == 0.d1d2d3... * 10^point`.
fn shortest_digits(x: f64) -> (String, i32) {
    let formatted = format!("{x:e}");
    let (mantissa, exp) = split_exponent(&formatted);
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    (digits, exp + 1)
}

fn split_exponent(formatted: &str) -> (&str, i32) {
    match formatted.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (formatted, 0),
    }
}

fn exponent_suffix(exp: i32) -> String {
    if exp < 0 {
        format!("e-{}", -exp)
    } else {
        format!("e+{exp}")
    }
}

fn non_finite(x: f64) -> Option<String> {
    if x.is_nan() {
        Some("NaN".to_string())
    } else if x == f64::INFINITY {
        Some("Infinity".to_string())
    } else if x == f64::NEG_INFINITY {
        Some("-Infinity".to_string())
    } else {
        None
    }
}

/// Rust writes `1.5e3`; JavaScript writes `1.5e+3`.
fn js_exponent(formatted: &str) -> String {
    let (mantissa, exp) = split_exponent(formatted);
    format!("{mantissa}{}", exponent_suffix(exp))
}

/// Enough fraction digits for `{:e}` to print any `f64` exactly.
const EXACT_DIGITS: usize = 767;

/// Exact decimal digits of a finite `x >= 0` and its decimal point, as in
/// [`shortest_digits`]. Zero yields all-zero digits with the point at 1.
fn exact_digits(x: f64) -> (Vec<u8>, i32) {
    let formatted = format!("{:.*e}", EXACT_DIGITS, x);
    let (mantissa, exp) = split_exponent(&formatted);
    let digits = mantissa.bytes().filter(u8::is_ascii_digit).map(|b| b - b'0').collect();
    (digits, exp + 1)
}

/// Keep the first `keep` digits, rounding ties up as the `Number` methods do.
///
/// Returns the kept digits and the new decimal point. A carry out of the first
/// digit yields `keep + 1` digits and moves the point right. A negative `keep`
/// rounds everything away.
fn round_digits(digits: &[u8], point: i32, keep: i32) -> (Vec<u8>, i32) {
    if keep < 0 {
        return (Vec::new(), point);
    }
    let keep = keep as usize;
    let mut kept: Vec<u8> = digits.iter().copied().take(keep).collect();
    kept.resize(keep, 0);
    if !matches!(digits.get(keep), Some(&d) if d >= 5) {
        return (kept, point);
    }
    for d in kept.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return (kept, point);
        }
    }
    kept.insert(0, 1);
    (kept, point + 1)
}

/// Round `|x|` to `precision` significant digits: the digits and the decimal exponent of the first.
fn significant_digits(x: f64, precision: usize) -> (Vec<u8>, i32) {
    let (digits, point) = exact_digits(x.abs());
    let (mut kept, point) = round_digits(&digits, point, precision as i32);
    kept.truncate(precision);
    (kept, point - 1)
}

fn digit_string(digits: &[u8]) -> String {
    digits.iter().map(|&d| char::from(b'0' + d)).collect()
}

fn sign_prefix(x: f64) -> &'static str {
    if x < 0.0 {
        "-"
    } else {
        ""
    }
}

fn exponential_form(x: f64, digits: &[u8], exp: i32) -> String {
    let text = digit_string(digits);
    let (first, rest) = text.split_at(1);
    let mut out = format!("{}{first}", sign_prefix(x));
    if !rest.is_empty() {
        out.push('.');
        out.push_str(rest);
    }
    out.push_str(&exponent_suffix(exp));
    out
}

/// `Number#toExponential(digits?)`.
pub fn to_exponential(x: f64, digits: Option<usize>) -> String {
    if let Some(special) = non_finite(x) {
        return special;
    }
    let x = if x == 0.0 { 0.0 } else { x };
    match digits {
        Some(d) => {
            let (kept, exp) = significant_digits(x, d.min(100) + 1);
            exponential_form(x, &kept, exp)
        }
        None => js_exponent(&format!("{x:e}")),
    }
}

/// `Number#toFixed(digits)`.
pub fn to_fixed(x: f64, digits: usize) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.abs() >= 1e21 {
        return to_js_string(x);
    }
    let f = digits.min(100);
    let (exact, point) = exact_digits(x.abs());
    let (kept, _) = round_digits(&exact, point, point + f as i32);

    let mut n = digit_string(&kept);
    if n.len() <= f {
        n.insert_str(0, &"0".repeat(f + 1 - n.len()));
    }
    if f > 0 {
        n.insert(n.len() - f, '.');
    }
    format!("{}{n}", sign_prefix(x))
}

/// `Number#toPrecision(precision)`, with the precision clamped to `1..=100`.
pub fn to_precision(x: f64, precision: usize) -> String {
    if let Some(special) = non_finite(x) {
        return special;
    }
    let p = precision.clamp(1, 100);
    let x = if x == 0.0 { 0.0 } else { x };
    let (kept, exp) = significant_digits(x, p);
    if exp < -6 || exp >= p as i32 {
        return exponential_form(x, &kept, exp);
    }

    let text = digit_string(&kept);
    let mut out = sign_prefix(x).to_string();
    if exp >= 0 {
        let (int, frac) = text.split_at(exp as usize + 1);
        out.push_str(int);
        if !frac.is_empty() {
            out.push('.');
            out.push_str(frac);
        }
    } else {
        out.push_str("0.");
        out.push_str(&"0".repeat((-exp - 1) as usize));
        out.push_str(&text);
    }
    out
}

/// `Number#toString(radix)`.
pub fn to_radix_string(x: f64, radix: u32) -> String {
    if let Some(special) = non_finite(x) {
        return special;
    }
    let negative = x < 0.0;
    let x = x.abs();
    let mut int = x.trunc();
    let mut frac = x - int;
    let base = radix as f64;

    let mut int_digits = Vec::new();
    loop {
        let d = (int % base) as u32;
        int_digits.push(digit_char(d));
        int = (int / base).trunc();
        if int < 1.0 {
            break;
        }
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(int_digits.iter().rev());

    if frac > 0.0 {
        out.push('.');
        let mut emitted = 0;
        while frac > 0.0 && emitted < 52 {
            frac *= base;
            let d = frac.trunc();
            out.push(digit_char(d as u32));
            frac -= d;
            emitted += 1;
        }
    }
    out
}

fn digit_char(d: u32) -> char {
    char::from_digit(d, 36).unwrap_or('0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_takes_leading_digits() {
        assert_eq!(parse_int("  42abc"), 42.0);
        assert_eq!(parse_int("-3.9"), -3.0);
        assert_eq!(parse_int("+7"), 7.0);
        assert!(parse_int("abc").is_nan());
        assert!(parse_int("").is_nan());
        assert!(parse_int("-").is_nan());
        assert_eq!(parse_int("0x10"), 0.0);
    }

    #[test]
    fn parse_int_auto_honours_hex_prefix() {
        assert_eq!(parse_int_auto("0x10"), 16.0);
        assert_eq!(parse_int_auto(" -0XfFz"), -255.0);
        assert_eq!(parse_int_auto("12px"), 12.0);
        assert!(parse_int_auto("0x").is_nan());
        assert!(parse_int_auto("0xg").is_nan());
    }

    #[test]
    fn parse_float_takes_longest_literal() {
        assert_eq!(parse_float("3.25kg"), 3.25);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float("x1").is_nan());
    }

    #[test]
    fn string_to_number_is_strict() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert!(string_to_number("42abc").is_nan());
        assert!(string_to_number("0x").is_nan());
    }

    #[test]
    fn js_string_matches_number_to_string() {
        assert_eq!(to_js_string(0.0), "0");
        assert_eq!(to_js_string(-0.0), "0");
        assert_eq!(to_js_string(42.0), "42");
        assert_eq!(to_js_string(-1.5), "-1.5");
        assert_eq!(to_js_string(0.1), "0.1");
        assert_eq!(to_js_string(1e21), "1e+21");
        assert_eq!(to_js_string(123456789012345680000.0), "123456789012345680000");
        assert_eq!(to_js_string(0.000001), "0.000001");
        assert_eq!(to_js_string(0.0000001), "1e-7");
        assert_eq!(to_js_string(1.5e-10), "1.5e-10");
        assert_eq!(to_js_string(f64::NAN), "NaN");
        assert_eq!(to_js_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn exponential_uses_explicit_exponent_sign() {
        assert_eq!(to_exponential(12345.0, None), "1.2345e+4");
        assert_eq!(to_exponential(12345.0, Some(2)), "1.23e+4");
        assert_eq!(to_exponential(0.00015, Some(1)), "1.5e-4");
        assert_eq!(to_exponential(0.0, None), "0e+0");
        assert_eq!(to_exponential(0.0, Some(2)), "0.00e+0");
    }

    #[test]
    fn exact_ties_round_up() {
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(1.5, 0), "2");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-0.5, 0), "-1");
        assert_eq!(to_fixed(-2.5, 0), "-3");
        assert_eq!(to_fixed(0.25, 1), "0.3");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(-0.125, 2), "-0.13");
        assert_eq!(to_exponential(1.25, Some(1)), "1.3e+0");
        assert_eq!(to_exponential(-1.25, Some(1)), "-1.3e+0");
        assert_eq!(to_exponential(125.0, Some(1)), "1.3e+2");
        assert_eq!(to_precision(2.5, 1), "3");
        assert_eq!(to_precision(-2.5, 1), "-3");
        assert_eq!(to_precision(0.125, 2), "0.13");
    }

    #[test]
    fn near_ties_follow_the_exact_binary_value() {
        // 1.005 is stored as 1.00499999999999989...
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(0.05, 1), "0.1");
        assert_eq!(to_exponential(0.00015, Some(1)), "1.5e-4");
    }

    #[test]
    fn rounding_carries_into_a_new_digit() {
        assert_eq!(to_fixed(9.96, 1), "10.0");
        assert_eq!(to_fixed(0.001, 0), "0");
        assert_eq!(to_fixed(-0.001, 0), "-0");
        assert_eq!(to_exponential(9.95, Some(0)), "1e+1");
        assert_eq!(to_precision(99.5, 2), "1.0e+2");
        assert_eq!(to_precision(0.0000001234, 2), "1.2e-7");
    }

    #[test]
    fn fixed_and_precision() {
        assert_eq!(to_fixed(0.5, 2), "0.50");
        assert_eq!(to_fixed(-0.0, 1), "0.0");
        assert_eq!(to_fixed(2.0, 0), "2");
        assert_eq!(to_precision(123.456, 4), "123.5");
        assert_eq!(to_precision(123.456, 2), "1.2e+2");
        assert_eq!(to_precision(0.000123, 2), "0.00012");
        assert_eq!(to_precision(0.0, 3), "0.00");
        assert_eq!(to_precision(9.99, 2), "10");
        assert_eq!(to_precision(-123.456, 4), "-123.5");
        assert_eq!(to_fixed(1234.5678, 2), "1234.57");
    }

    #[test]
    fn radix_strings() {
        assert_eq!(to_radix_string(255.0, 16), "ff");
        assert_eq!(to_radix_string(5.0, 2), "101");
        assert_eq!(to_radix_string(-8.0, 8), "-10");
        assert_eq!(to_radix_string(0.0, 2), "0");
        assert_eq!(to_radix_string(8.5, 8), "10.4");
    }

    #[test]
    fn unsigned_wrapping() {
        assert_eq!(to_uint32(-1.0), 4_294_967_295.0);
        assert_eq!(to_uint32(f64::NAN), 0.0);
        assert_eq!(to_uint16(65.0), 65.0);
        assert_eq!(to_uint16(65_601.0), 65.0);
    }
}
