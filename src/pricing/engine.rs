// Pricing Engine
//
// Turns the four raw price fields into a priced unit. Pure and deterministic:
// called after every field edit, so it holds no state and never fails.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::pricing::models::{PriceInput, PriceResult};

/// Leading numeric prefix: sign, digits, optional fraction, optional exponent
fn numeric_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([+-]?)(\d*)(?:\.(\d*))?(?:[eE]([+-]?\d+))?")
            .expect("numeric prefix pattern is valid")
    })
}

/// Parse decimal text leniently
///
/// Reads the longest numeric prefix after trimming whitespace, so `"12abc"`
/// parses as 12. Blank text, text without a leading number, and values outside
/// the decimal range all parse as zero. Never fails.
pub fn parse_decimal_or_zero(text: &str) -> Decimal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    match parse_prefix(trimmed) {
        Some(value) => value,
        None => {
            tracing::debug!("Coercing non-numeric input {:?} to zero", text);
            Decimal::ZERO
        }
    }
}

fn parse_prefix(text: &str) -> Option<Decimal> {
    let captures = numeric_prefix().captures(text)?;
    let sign = captures.get(1).map_or("", |m| m.as_str());
    let whole = captures.get(2).map_or("", |m| m.as_str());
    let fraction = captures.get(3).map_or("", |m| m.as_str());

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let mantissa = format!(
        "{}{}.{}",
        if sign == "-" { "-" } else { "" },
        if whole.is_empty() { "0" } else { whole },
        if fraction.is_empty() { "0" } else { fraction },
    );

    match captures.get(4) {
        Some(exponent) => {
            let exponent = exponent.as_str().trim_start_matches('+');
            Decimal::from_scientific(&format!("{}e{}", mantissa, exponent)).ok()
        }
        None => Decimal::from_str(&mantissa).ok(),
    }
}

/// Pricing Engine
///
/// Applies discount, then tax on the discounted price, then the flat
/// additional cost.
pub struct PricingEngine;

impl PricingEngine {
    /// Compute a unit price from raw text fields
    ///
    /// Returns `None` when the cost parses to zero; callers must treat that as
    /// "no price" and disable commit actions.
    pub fn compute(input: &PriceInput) -> Option<PriceResult> {
        Self::compute_values(
            parse_decimal_or_zero(&input.cost),
            parse_decimal_or_zero(&input.discount),
            parse_decimal_or_zero(&input.sales_tax),
            parse_decimal_or_zero(&input.additional_cost),
        )
    }

    /// Compute a unit price from already-parsed values
    ///
    /// # Arguments
    /// * `cost` - Original cost per unit
    /// * `discount_percent` - Discount applied to the cost (negative raises the price)
    /// * `tax_percent` - Sales tax applied to the discounted price
    /// * `additional_cost` - Flat per-unit amount added after tax
    ///
    /// Percentages are not clamped to 0..=100. Arithmetic that would overflow
    /// the decimal range yields `None`.
    pub fn compute_values(
        cost: Decimal,
        discount_percent: Decimal,
        tax_percent: Decimal,
        additional_cost: Decimal,
    ) -> Option<PriceResult> {
        if cost.is_zero() {
            return None;
        }

        let result = Self::apply(cost, discount_percent, tax_percent, additional_cost);
        if result.is_none() {
            tracing::debug!(
                "Price computation overflowed for cost {} (discount {}%, tax {}%)",
                cost,
                discount_percent,
                tax_percent
            );
        }
        result
    }

    fn apply(
        cost: Decimal,
        discount_percent: Decimal,
        tax_percent: Decimal,
        additional_cost: Decimal,
    ) -> Option<PriceResult> {
        let discount_amount = cost
            .checked_mul(discount_percent)?
            .checked_div(Decimal::ONE_HUNDRED)?;
        let price_after_discount = cost.checked_sub(discount_amount)?;

        // Tax is levied on the discounted price, never on the raw cost
        let tax_amount = price_after_discount
            .checked_mul(tax_percent)?
            .checked_div(Decimal::ONE_HUNDRED)?;

        let unit_price = price_after_discount
            .checked_add(tax_amount)?
            .checked_add(additional_cost)?;

        Some(PriceResult {
            cost,
            discount_amount,
            price_after_discount,
            tax_amount,
            additional_cost,
            unit_price,
        })
    }
}
