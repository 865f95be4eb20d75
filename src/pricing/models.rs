use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw price fields as entered by the seller
///
/// Values stay as text while being edited and are parsed on use. Blank or
/// unparsable text counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInput {
    pub cost: String,
    pub discount: String,
    pub sales_tax: String,
    pub additional_cost: String,
}

impl PriceInput {
    pub fn new(
        cost: impl Into<String>,
        discount: impl Into<String>,
        sales_tax: impl Into<String>,
        additional_cost: impl Into<String>,
    ) -> Self {
        Self {
            cost: cost.into(),
            discount: discount.into(),
            sales_tax: sales_tax.into(),
            additional_cost: additional_cost.into(),
        }
    }
}

/// Derived breakdown of a single unit's price
///
/// Never stored on its own; it is always recomputed from a `PriceInput`.
/// No rounding is applied to any field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResult {
    pub cost: Decimal,
    pub discount_amount: Decimal,
    pub price_after_discount: Decimal,
    pub tax_amount: Decimal,
    pub additional_cost: Decimal,
    pub unit_price: Decimal,
}

impl PriceResult {
    /// Unit price multiplied by quantity, for display only
    ///
    /// `None` when the product leaves the decimal range.
    pub fn line_total(&self, quantity: u32) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(quantity))
    }
}
