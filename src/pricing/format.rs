// Presentation helpers for prices
// Display rounding lives here only; nothing formatted feeds back into state.

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::OnceLock;

use crate::pricing::engine::parse_decimal_or_zero;
use crate::pricing::models::{PriceInput, PriceResult};

fn non_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\D").expect("non-digit pattern is valid"))
}

/// Format an amount as US dollars with two decimals
///
/// Rounds half away from zero and groups thousands: `1234.5` -> `$1,234.50`,
/// `-0.126` -> `-$0.13`.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, grouped, fraction)
}

/// Cash-register style entry: digits are read as cents
///
/// Every non-digit is dropped, then the last two digits become the fraction.
/// `"4999"` -> `"49.99"`, `"5"` -> `"0.05"`, `"$1,2"` -> `"0.12"`. Returns an
/// empty string when no digits remain.
pub fn format_cents_input(raw: &str) -> String {
    let digits = non_digits().replace_all(raw, "");
    if digits.is_empty() {
        return String::new();
    }

    let significant = digits.trim_start_matches('0');
    let padded = format!("{:0>3}", significant);
    let (whole, fraction) = padded.split_at(padded.len() - 2);
    format!("{}.{}", whole, fraction)
}

/// One labelled line of a price breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownLine {
    pub label: String,
    pub amount: String,
}

impl BreakdownLine {
    fn new(label: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            amount: amount.into(),
        }
    }
}

/// Formatted summary of a priced unit, ready for display
///
/// Only the original cost line is present when there is no price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub lines: Vec<BreakdownLine>,
    pub final_price: Option<String>,
}

impl PriceBreakdown {
    pub fn new(input: &PriceInput, result: Option<&PriceResult>) -> Self {
        let original = if input.cost.trim().is_empty() {
            format_currency(Decimal::ZERO)
        } else {
            format_currency(parse_decimal_or_zero(&input.cost))
        };
        let mut lines = vec![BreakdownLine::new("Original Cost", original)];

        let Some(result) = result else {
            return Self {
                lines,
                final_price: None,
            };
        };

        lines.push(BreakdownLine::new(
            format!("Discount ({}%)", percent_label(&input.discount)),
            format!("-{}", format_currency(result.discount_amount)),
        ));
        lines.push(BreakdownLine::new(
            format!("Sales Tax ({}%)", percent_label(&input.sales_tax)),
            format!("+{}", format_currency(result.tax_amount)),
        ));
        if result.additional_cost > Decimal::ZERO {
            lines.push(BreakdownLine::new(
                "Additional Cost",
                format!("+{}", format_currency(result.additional_cost)),
            ));
        }

        Self {
            lines,
            final_price: Some(format_currency(result.unit_price)),
        }
    }
}

fn percent_label(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}
