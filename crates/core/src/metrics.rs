// ABOUTME: Converts abbreviated engagement counts ("12.3K", "1.2M", "1,024") into exact integers.
// ABOUTME: Total functions: malformed input resolves to zero instead of failing.

use serde_json::Value;

/// Parses an abbreviated count into an integer.
///
/// - Empty or whitespace-only input is 0.
/// - A trailing `K`/`k` multiplies the leading number by 1,000; `M`/`m` by 1,000,000.
///   Only the longest numeric prefix counts, so "1,2K" is 1,000. The product is
///   truncated toward zero.
/// - Otherwise every non-digit character is dropped and the rest is parsed.
/// - Anything without digits is 0. Values past `u64::MAX` saturate.
pub fn normalize_count(text: &str) -> u64 {
    try_count(text).unwrap_or(0)
}

/// Like [`normalize_count`] but returns `None` for non-empty input that carries no number.
///
/// Lets callers tell a genuine zero apart from text that could not be read.
pub fn try_count(text: &str) -> Option<u64> {
    let s = text.trim();
    if s.is_empty() {
        return Some(0);
    }

    if let Some(num) = strip_suffix_ignore_case(s, 'k') {
        return scale(num, 1_000.0);
    }
    if let Some(num) = strip_suffix_ignore_case(s, 'm') {
        return scale(num, 1_000_000.0);
    }

    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Only overflow can fail here
    Some(digits.parse::<u64>().unwrap_or(u64::MAX))
}

/// Reads a count out of a structured feed value.
///
/// Integers are exact and taken as-is. Numeric strings go through
/// [`normalize_count`]. Negative numbers, booleans, null and containers are 0.
pub fn normalize_metric(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f > 0.0 {
                    f.trunc() as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        Value::String(s) => normalize_count(s),
        _ => 0,
    }
}

fn strip_suffix_ignore_case(s: &str, suffix: char) -> Option<&str> {
    s.strip_suffix(suffix)
        .or_else(|| s.strip_suffix(suffix.to_ascii_uppercase()))
}

/// Longest leading decimal number in `s`, ignoring whatever follows it.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

fn scale(num: &str, multiplier: f64) -> Option<u64> {
    let value = leading_number(num)?;
    if !value.is_finite() {
        return None;
    }
    if value <= 0.0 {
        return Some(0);
    }
    let scaled = value * multiplier;
    // 1.15 * 1000 lands on 1149.999..., snap representation error before truncating
    let nearest = scaled.round();
    let exact = if (scaled - nearest).abs() < 1e-6 {
        nearest
    } else {
        scaled.trunc()
    };
    Some(exact as u64)
}
