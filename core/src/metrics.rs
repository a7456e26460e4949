//! Metrics derived from flow analytics.

use crate::types::FlowAnalytics;

const SIGNIFICANT_DIGITS: usize = 4;

// Enough fractional digits to print any finite f64 exactly.
const EXACT_DIGITS: usize = 800;

/// Percentage of successful calls, rounded to 4 significant figures.
///
/// A flow that has never been called reports exactly 100.
pub fn success_rate(analytics: &FlowAnalytics) -> f64 {
    if analytics.calls == 0 {
        return 100.0;
    }
    let rate = analytics.success as f64 / analytics.calls as f64 * 100.0;
    round_significant(rate, SIGNIFICANT_DIGITS)
}

/// Round to `digits` significant figures.
///
/// The decision is taken on the exact decimal expansion of `value`, and an
/// exact tie goes to the larger magnitude. Scaling by a power of ten first
/// would round twice.
fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    let exact = format!("{:.*e}", EXACT_DIGITS, value.abs());
    let Some((mantissa, exponent)) = exact.split_once('e') else {
        return value;
    };
    let Ok(mut exponent) = exponent.parse::<i32>() else {
        return value;
    };
    let expansion: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();

    let mut kept = expansion[..digits]
        .iter()
        .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
    if expansion.get(digits).is_some_and(|d| *d >= b'5') {
        kept += 1;
    }
    if kept == 10u64.pow(digits as u32) {
        kept /= 10;
        exponent += 1;
    }

    let shift = exponent - (digits as i32 - 1);
    format!("{kept}e{shift}")
        .parse::<f64>()
        .map(|rounded| rounded.copysign(value))
        .unwrap_or(value)
}
