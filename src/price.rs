//! # Price Parsing Module
//!
//! Converts user-entered prices into exact integer cents and back.
//!
//! ## Accepted notations
//!
//! - `2`, `2.50`, `2,50`, `.5`
//! - surrounding currency markers: `2€`, `€ 2,50`, `$3`, `4 EUR`
//!
//! Values with more than two decimal digits are rounded half-up on the
//! decimal text itself, so `0.005` becomes 1 cent. No binary floating point
//! is involved at any step.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CURRENCY_MARKERS: Regex =
        Regex::new(r"(?i)\p{Sc}|eur(?:os?)?|usd").expect("Currency pattern should be valid");
    static ref DECIMAL_PATTERN: Regex =
        Regex::new(r"^(?P<int>[0-9]*)(?:\.(?P<frac>[0-9]*))?$").expect("Decimal pattern should be valid");
    static ref STOCK_PATTERN: Regex = Regex::new(r"^[0-9]+$").expect("Stock pattern should be valid");
}

/// Parse a price into cents. Returns `None` for non-numeric or negative input.
pub fn parse_price(text: &str) -> Option<i64> {
    let stripped = CURRENCY_MARKERS.replace_all(text, "");
    let normalized = stripped.trim().replace(',', ".");

    let caps = DECIMAL_PATTERN.captures(&normalized)?;
    let int_part = caps.name("int").map_or("", |m| m.as_str());
    let frac_part = caps.name("frac").map_or("", |m| m.as_str());

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let units: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    let mut digits = frac_part.bytes().map(|b| i64::from(b - b'0'));
    let tenths = digits.next().unwrap_or(0);
    let hundredths = digits.next().unwrap_or(0);
    let round_up = digits.next().is_some_and(|d| d >= 5);

    units
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths)?
        .checked_add(i64::from(round_up))
}

/// Render cents with exactly two decimal digits, e.g. `120` -> `"1.20"`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a non-negative whole stock count
pub fn parse_stock(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if !STOCK_PATTERN.is_match(trimmed) {
        return None;
    }
    trimmed.parse().ok()
}
