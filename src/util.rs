// Value normalization and number formatting.
//
// Inventory exports mix real numbers with locale-formatted text such as
// "$ 1234,56". Everything that turns a cell into an `f64` goes through `clean`
// so the aggregation passes can rely on a single "not a number" signal.
use crate::types::Value;
use num_format::{Locale, ToFormattedString};

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Normalize a cell into a number.
///
/// - Numbers pass through unchanged.
/// - Text has currency symbols and whitespace stripped, the first `,` (the
///   decimal separator in this dataset) replaced with `.`, and then its
///   leading numeral is parsed; trailing text is ignored, so `"12 pzas"` is 12.
/// - Returns `None` when the value is not a usable number; callers must
///   check before accumulating.
pub fn clean(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::Text(s) => clean_str(s),
        _ => None,
    }
}

/// Text half of [`clean`], also used where raw strings are at hand.
pub fn clean_str(s: &str) -> Option<f64> {
    let stripped: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    if stripped.is_empty() {
        return None;
    }
    let normalized = stripped.replacen(',', ".", 1);
    let end = leading_numeral_len(normalized.as_bytes());
    if end == 0 {
        return None;
    }
    normalized[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Length of the longest prefix of the form `[+-]digits[.digits][e[+-]digits]`.
///
/// Returns 0 when the prefix holds no mantissa digit. Words such as "inf" or
/// "NaN" never match.
fn leading_numeral_len(b: &[u8]) -> usize {
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_end = digits_from(i);
    let mut mantissa_digits = int_end - i;
    i = int_end;
    if b.get(i) == Some(&b'.') {
        let frac_end = digits_from(i + 1);
        mantissa_digits += frac_end - (i + 1);
        i = frac_end;
    }
    if mantissa_digits == 0 {
        return 0;
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    i
}

/// Divide, returning 0 when the denominator is not positive.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators (e.g. `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = group_thousands(int_part);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Insert the locale's thousands separator into a run of integer digits.
fn group_thousands(digits: &str) -> String {
    let sep = Locale::en.separator();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * sep.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(ch);
    }
    out
}

/// Currency in the dashboard's peso style, e.g. `$1,234.56` or `-$12.00`.
pub fn format_currency(n: f64) -> String {
    let body = format_number(n.abs(), 2);
    if n.is_sign_negative() && n != 0.0 {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
