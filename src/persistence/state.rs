use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::CalcResult;
use crate::ledger::{ItemId, LedgerItem};
use crate::persistence::store::KeyValueStore;
use crate::pricing::PriceInput;

/// Default namespace for persisted calculator keys
pub const DEFAULT_KEY_PREFIX: &str = "calculator_";

pub const FIELD_COST: &str = "cost";
pub const FIELD_DISCOUNT: &str = "discount";
pub const FIELD_SALES_TAX: &str = "salesTax";
pub const FIELD_ADDITIONAL_COST: &str = "additionalCost";
pub const FIELD_QUANTITY: &str = "quantity";
pub const FIELD_PRODUCT_ID: &str = "productId";
pub const FIELD_ITEMS: &str = "items";

/// Form fields cleared by a reset; the item list is kept
const FORM_FIELDS: [&str; 6] = [
    FIELD_COST,
    FIELD_DISCOUNT,
    FIELD_SALES_TAX,
    FIELD_ADDITIONAL_COST,
    FIELD_QUANTITY,
    FIELD_PRODUCT_ID,
];

/// Builds namespaced storage keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateKeys {
    prefix: String,
}

impl StateKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field)
    }
}

impl Default for StateKeys {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

/// Full calculator state as exchanged with storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub input: PriceInput,
    pub quantity: u32,
    pub product_id: String,
    pub items: Vec<LedgerItem>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            input: PriceInput::default(),
            quantity: 1,
            product_id: String::new(),
            items: Vec::new(),
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// Persisted shape of a ledger item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredItem {
    #[serde(rename = "id")]
    pub product_id: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub sales_tax: String,
    #[serde(default)]
    pub additional_cost: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(serialize_with = "serialize_price")]
    pub final_price: Decimal,
    pub item_id: ItemId,
}

/// Write a price as a JSON number when the number reads back to the same text
///
/// Prices with more digits than a double holds stay strings. Loading accepts
/// either form.
fn serialize_price<S: Serializer>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let text = price.to_string();
    if let Some(whole) = price.to_i64().filter(|whole| whole.to_string() == text) {
        return serializer.serialize_i64(whole);
    }
    match price.to_f64() {
        Some(number) if number.to_string() == text => serializer.serialize_f64(number),
        _ => serializer.serialize_str(&text),
    }
}

impl From<&LedgerItem> for StoredItem {
    fn from(item: &LedgerItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            cost: item.input.cost.clone(),
            discount: item.input.discount.clone(),
            sales_tax: item.input.sales_tax.clone(),
            additional_cost: item.input.additional_cost.clone(),
            quantity: item.quantity,
            final_price: item.unit_price,
            item_id: item.item_id.clone(),
        }
    }
}

impl From<StoredItem> for LedgerItem {
    fn from(stored: StoredItem) -> Self {
        Self {
            item_id: stored.item_id,
            product_id: stored.product_id,
            input: PriceInput::new(
                stored.cost,
                stored.discount,
                stored.sales_tax,
                stored.additional_cost,
            ),
            unit_price: stored.final_price,
            // Older records may carry 0; the ledger never holds it
            quantity: stored.quantity.max(1),
        }
    }
}

/// Write every field of the snapshot
pub fn save_state(
    store: &mut dyn KeyValueStore,
    keys: &StateKeys,
    snapshot: &StateSnapshot,
) -> CalcResult<()> {
    let items: Vec<StoredItem> = snapshot.items.iter().map(StoredItem::from).collect();
    let items = serde_json::to_string(&items)?;

    store.set(&keys.key(FIELD_COST), &snapshot.input.cost)?;
    store.set(&keys.key(FIELD_DISCOUNT), &snapshot.input.discount)?;
    store.set(&keys.key(FIELD_SALES_TAX), &snapshot.input.sales_tax)?;
    store.set(&keys.key(FIELD_ADDITIONAL_COST), &snapshot.input.additional_cost)?;
    store.set(&keys.key(FIELD_QUANTITY), &snapshot.quantity.to_string())?;
    store.set(&keys.key(FIELD_PRODUCT_ID), &snapshot.product_id)?;
    store.set(&keys.key(FIELD_ITEMS), &items)?;

    tracing::debug!("Saved calculator state with {} items", snapshot.items.len());
    Ok(())
}

/// Read the snapshot back, using defaults for any missing key
///
/// Corrupt values never fail the load: a bad quantity becomes 1 and an
/// unreadable item list becomes empty. Only store failures are errors.
pub fn load_state(store: &dyn KeyValueStore, keys: &StateKeys) -> CalcResult<StateSnapshot> {
    let text = |field: &str| -> CalcResult<String> {
        Ok(store.get(&keys.key(field))?.unwrap_or_default())
    };

    let input = PriceInput::new(
        text(FIELD_COST)?,
        text(FIELD_DISCOUNT)?,
        text(FIELD_SALES_TAX)?,
        text(FIELD_ADDITIONAL_COST)?,
    );

    let quantity = match store.get(&keys.key(FIELD_QUANTITY))? {
        None => 1,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => {
                tracing::warn!("Ignoring invalid persisted quantity {:?}", raw);
                1
            }
        },
    };

    let items = match store.get(&keys.key(FIELD_ITEMS))? {
        None => Vec::new(),
        Some(raw) if raw.trim().is_empty() => Vec::new(),
        Some(raw) => match serde_json::from_str::<Vec<StoredItem>>(&raw) {
            Ok(stored) => stored.into_iter().map(LedgerItem::from).collect(),
            Err(err) => {
                tracing::warn!("Discarding unreadable persisted items: {}", err);
                Vec::new()
            }
        },
    };

    let snapshot = StateSnapshot {
        input,
        quantity,
        product_id: text(FIELD_PRODUCT_ID)?,
        items,
    };
    tracing::debug!("Loaded calculator state with {} items", snapshot.items.len());
    Ok(snapshot)
}

/// Delete the persisted form fields, keeping the item list
pub fn clear_form_state(store: &mut dyn KeyValueStore, keys: &StateKeys) -> CalcResult<()> {
    for field in FORM_FIELDS {
        store.remove(&keys.key(field))?;
    }
    Ok(())
}
