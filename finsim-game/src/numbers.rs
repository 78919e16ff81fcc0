//! Numeric helpers centralizing safe casts and money formatting.

use num_traits::cast::cast;

/// Format a dollar amount with two decimals, e.g. `12.50`.
#[must_use]
pub fn format_money(value: f64) -> String {
    format!("{:.2}", sanitize(value))
}

/// Format a dollar delta with an explicit sign, e.g. `+$4.50` or `-$3.00`.
#[must_use]
pub fn format_signed_money(value: f64) -> String {
    let value = sanitize(value);
    if value >= 0.0 {
        format!("+${value:.2}")
    } else {
        format!("-${:.2}", -value)
    }
}

/// Format a fractional rate as a signed percentage, e.g. `0.123` -> `+12.3%`.
#[must_use]
pub fn format_signed_pct(rate: f64, decimals: usize) -> String {
    let pct = rate * 100.0;
    if pct >= 0.0 {
        format!("+{pct:.decimals$}%")
    } else {
        format!("{pct:.decimals$}%")
    }
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

fn sanitize(value: f64) -> f64 {
    // Avoid rendering "-0.00".
    if value.abs() < 0.005 { 0.0 } else { value }
}
