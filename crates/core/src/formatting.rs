//! Display helpers for prices, spreads and volumes.
//!
//! All rounding goes through `rust_decimal` so the shell never shows binary
//! float artifacts or scientific notation.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

const DEFAULT_PRICE_DECIMALS: u32 = 6;
const PLACEHOLDER: &str = "-";

fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    // `f64::to_string` yields the shortest representation that round-trips.
    Decimal::from_str(&value.to_string()).ok()
}

/// Number of decimal places implied by a tick size such as `0.001`.
pub fn decimal_places_from_tick(tick_size: Option<f64>) -> u32 {
    match tick_size.and_then(to_decimal) {
        Some(tick) if !tick.is_zero() => tick.normalize().scale(),
        _ => DEFAULT_PRICE_DECIMALS,
    }
}

/// Format a price truncated to the pair's tick precision, without trailing zeros.
pub fn format_price(value: Option<f64>, tick_size: Option<f64>) -> String {
    let Some(price) = value.and_then(to_decimal) else {
        return PLACEHOLDER.to_string();
    };
    let decimals = decimal_places_from_tick(tick_size);
    price
        .round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
        .normalize()
        .to_string()
}

/// Format a spread as a percentage.
///
/// Values up to 1 are taken as fractions and scaled by 100. Percentages below
/// one keep four decimals, larger ones two.
pub fn format_spread(value: Option<f64>) -> String {
    let Some(spread) = value.and_then(to_decimal) else {
        return PLACEHOLDER.to_string();
    };
    let percent = if spread <= Decimal::ONE {
        spread * Decimal::ONE_HUNDRED
    } else {
        spread
    };
    let places = if percent.abs() < Decimal::ONE { 4 } else { 2 };
    let rounded = percent.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven);
    format!("{:.*}%", places as usize, rounded)
}

/// Format a 24h volume with thousands separators and magnitude-based precision.
pub fn format_volume(value: Option<f64>) -> String {
    let Some(volume) = value.and_then(to_decimal) else {
        return PLACEHOLDER.to_string();
    };
    let magnitude = volume.abs();
    let places = if magnitude >= Decimal::from(1_000_000) {
        0
    } else if magnitude >= Decimal::from(1_000) {
        1
    } else {
        2
    };
    let rounded = volume
        .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    group_thousands(&rounded.to_string())
}

fn group_thousands(raw: &str) -> String {
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
