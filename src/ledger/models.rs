use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pricing::PriceInput;

/// System-generated identity of a ledger item
///
/// Unique within a ledger and never changed after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A committed, priced product in the ledger
///
/// `unit_price` is a snapshot taken at commit time and is not re-derived from
/// `input` afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerItem {
    pub item_id: ItemId,
    pub product_id: String,
    pub input: PriceInput,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LedgerItem {
    /// Unit price multiplied by quantity, `None` on overflow
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}
