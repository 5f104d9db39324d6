// Parsing and small numeric helpers.
//
// All locale-formatted number handling lives here so the pipeline stages can
// work on plain `f64`s.
use num_format::{Locale, ToFormattedString};

/// Normalise a decimal-comma string (`"12,5"`) and parse it.
///
/// Every `,` becomes `.`, so a thousands-grouped value such as `"1.234,56"`
/// turns into `"1.234.56"` and fails to parse. Non-finite results are
/// rejected as well.
pub fn parse_decimal(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.replace(',', ".").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Total version of [`parse_decimal`]: anything unusable becomes `0.0`.
pub fn coerce_f64(s: Option<&str>) -> f64 {
    parse_decimal(s).unwrap_or(0.0)
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Minimum and maximum of a slice, `None` when empty.
pub fn min_max(v: &[f64]) -> Option<(f64, f64)> {
    let first = *v.first()?;
    Some(v.iter().fold((first, first), |(lo, hi), &x| (lo.min(x), hi.max(x))))
}

/// Quantile with linear interpolation between closest ranks
/// (`q` in [0, 1]). Returns 0 for an empty slice.
pub fn quantile(v: &[f64], q: f64) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let mut sorted = v.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators on the integer part
    // (e.g. `1,234,567.89`).
    if !n.is_finite() {
        return n.to_string();
    }
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // Avoid printing "-0.00" for values that round to zero.
    let is_zero = s.chars().all(|c| c == '0' || c == '.');
    if n.is_sign_negative() && !is_zero {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
