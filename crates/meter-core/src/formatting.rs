use rust_decimal::{Decimal, RoundingStrategy};

/// Format a decimal with thousands separators and a fixed number of places.
///
/// Midpoints round away from zero.
///
/// # Examples
///
/// ```
/// use meter_core::formatting::format_decimal;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let d = |s: &str| Decimal::from_str(s).unwrap();
/// assert_eq!(format_decimal(d("1234.5"), 1), "1,234.5");
/// assert_eq!(format_decimal(d("1234567"), 0), "1,234,567");
/// assert_eq!(format_decimal(d("0"), 2), "0.00");
/// assert_eq!(format_decimal(d("-9876.5"), 1), "-9,876.5");
/// assert_eq!(format_decimal(d("0.125"), 2), "0.13");
/// ```
pub fn format_decimal(value: Decimal, decimals: u32) -> String {
    let mut rounded =
        value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    rounded = rounded.abs();
    rounded.rescale(decimals);
    let text = rounded.to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let grouped = group_thousands(int_part);
    let result = match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a meter quantity with its unit, three decimal places.
///
/// Three places match the precision readings are stored with.
///
/// # Examples
///
/// ```
/// use meter_core::formatting::format_quantity;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_quantity(Decimal::new(60, 0), "kWh"), "60.000 kWh");
/// assert_eq!(format_quantity(Decimal::new(15327, 1), "m³"), "1,532.700 m³");
/// ```
pub fn format_quantity(value: Decimal, unit: &str) -> String {
    format!("{} {}", format_decimal(value, 3), unit)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
