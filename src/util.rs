// Parsing and formatting helpers.
//
// CSV cells are parsed here so the loader can work with typed values, and
// every number shown to the operator goes through `format_number` so rounding
// stays a presentation concern.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Trimmed, non-empty text cell.
pub fn parse_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators (`1,234,567.89`). The digit
    // string is grouped directly so values past `i64::MAX` keep every digit.
    let s = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    let mut res = group_thousands(int_part);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // `-0` after rounding is just zero.
    if n.is_sign_negative() && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Percentage cell; an undefined ratio renders as `n/a`.
pub fn format_pct(pct: Option<f64>, decimals: usize) -> String {
    match pct {
        Some(p) => format_number(p, decimals),
        None => "n/a".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
