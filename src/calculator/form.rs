// Calculator session
//
// Holds the seller's in-progress entry, recomputes the price after every
// change, commits priced units into the ledger and mirrors everything to
// storage when a store is attached.

use rust_decimal::Decimal;
use std::fmt;

use crate::config::CalculatorConfig;
use crate::error::{CalcResult, CalculatorError};
use crate::ledger::{ItemId, ItemLedger, LedgerItem};
use crate::metrics::CalculatorMetrics;
use crate::persistence::{
    clear_form_state, load_state, save_state, KeyValueStore, StateKeys, StateSnapshot,
};
use crate::pricing::{format_cents_input, PriceBreakdown, PriceInput, PriceResult, PricingEngine};

/// One of the four price entry fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Cost,
    Discount,
    SalesTax,
    AdditionalCost,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Cost => "cost",
            PriceField::Discount => "discount",
            PriceField::SalesTax => "salesTax",
            PriceField::AdditionalCost => "additionalCost",
        }
    }
}

struct Storage {
    store: Box<dyn KeyValueStore>,
    keys: StateKeys,
}

/// Interactive calculator state bound to an item ledger
///
/// At most one ledger item is in edit mode at a time. That rule lives here,
/// not in the ledger: starting a new edit replaces the previous one.
pub struct CalculatorForm {
    input: PriceInput,
    quantity: u32,
    product_id: String,
    result: Option<PriceResult>,
    ledger: ItemLedger,
    editing: Option<ItemId>,
    storage: Option<Storage>,
    metrics: CalculatorMetrics,
}

impl CalculatorForm {
    /// Empty calculator with no storage attached
    pub fn new() -> Self {
        Self::with_ledger(ItemLedger::new())
    }

    pub fn with_ledger(ledger: ItemLedger) -> Self {
        Self {
            input: PriceInput::default(),
            quantity: 1,
            product_id: String::new(),
            result: None,
            ledger,
            editing: None,
            storage: None,
            metrics: CalculatorMetrics::new(),
        }
    }

    /// Rehydrate from a snapshot without attaching storage
    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        let mut form = Self::new();
        form.apply_snapshot(snapshot);
        form
    }

    /// Load state from `store` and save back to it after every change
    pub fn with_store(
        store: Box<dyn KeyValueStore>,
        keys: StateKeys,
        ledger: ItemLedger,
    ) -> CalcResult<Self> {
        let snapshot = load_state(store.as_ref(), &keys)?;
        let mut form = Self::with_ledger(ledger);
        form.apply_snapshot(snapshot);
        form.storage = Some(Storage { store, keys });

        tracing::info!(
            "Calculator restored with {} items (total {})",
            form.ledger.len(),
            form.ledger
                .total()
                .map(|total| total.to_string())
                .unwrap_or_else(|| "out of range".to_string())
        );
        Ok(form)
    }

    /// Build a calculator from configuration: store, key prefix and id source
    pub fn from_config(config: &CalculatorConfig) -> CalcResult<Self> {
        let ledger = ItemLedger::with_id_source(config.id_strategy.into_source());
        Self::with_store(config.open_store()?, config.state_keys(), ledger)
    }

    fn apply_snapshot(&mut self, snapshot: StateSnapshot) {
        self.input = snapshot.input;
        self.quantity = snapshot.quantity.max(1);
        self.product_id = snapshot.product_id;
        self.ledger.restore(snapshot.items);
        self.editing = None;
        self.recompute();
    }

    /// Current full state for the storage collaborator
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            input: self.input.clone(),
            quantity: self.quantity,
            product_id: self.product_id.clone(),
            items: self.ledger.items().to_vec(),
        }
    }

    fn recompute(&mut self) {
        self.result = PricingEngine::compute(&self.input);
        self.metrics.record_computation(self.result.is_some());
        tracing::debug!(
            "Recomputed price: {}",
            self.result
                .map(|r| r.unit_price.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }

    fn persist(&mut self) -> CalcResult<()> {
        if self.storage.is_none() {
            return Ok(());
        }
        let snapshot = self.snapshot();
        if let Some(storage) = self.storage.as_mut() {
            save_state(storage.store.as_mut(), &storage.keys, &snapshot)?;
        }
        Ok(())
    }

    fn clear_entry(&mut self) {
        self.input = PriceInput::default();
        self.quantity = 1;
        self.product_id.clear();
        self.recompute();
    }

    // ------------------------------------------------------------------
    // Field entry
    // ------------------------------------------------------------------

    /// Replace a price field's text and recompute
    pub fn set_field(&mut self, field: PriceField, text: impl Into<String>) -> CalcResult<()> {
        let text = text.into();
        match field {
            PriceField::Cost => self.input.cost = text,
            PriceField::Discount => self.input.discount = text,
            PriceField::SalesTax => self.input.sales_tax = text,
            PriceField::AdditionalCost => self.input.additional_cost = text,
        }
        self.recompute();
        self.persist()
    }

    /// Cash-register entry: raw keystrokes are read as cents
    pub fn enter_cents(&mut self, field: PriceField, raw: &str) -> CalcResult<()> {
        self.set_field(field, format_cents_input(raw))
    }

    pub fn set_cost(&mut self, text: impl Into<String>) -> CalcResult<()> {
        self.set_field(PriceField::Cost, text)
    }

    pub fn set_discount(&mut self, text: impl Into<String>) -> CalcResult<()> {
        self.set_field(PriceField::Discount, text)
    }

    pub fn set_sales_tax(&mut self, text: impl Into<String>) -> CalcResult<()> {
        self.set_field(PriceField::SalesTax, text)
    }

    pub fn set_additional_cost(&mut self, text: impl Into<String>) -> CalcResult<()> {
        self.set_field(PriceField::AdditionalCost, text)
    }

    /// Set the quantity; zero is raised to 1
    pub fn set_quantity(&mut self, quantity: u32) -> CalcResult<()> {
        self.quantity = quantity.max(1);
        self.persist()
    }

    /// Set the quantity from text; anything but a positive integer becomes 1
    pub fn set_quantity_text(&mut self, text: &str) -> CalcResult<()> {
        let quantity = match text.trim().parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => {
                tracing::debug!("Coercing quantity {:?} to 1", text);
                1
            }
        };
        self.set_quantity(quantity)
    }

    pub fn set_product_id(&mut self, product_id: impl Into<String>) -> CalcResult<()> {
        self.product_id = product_id.into();
        self.persist()
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    pub fn input(&self) -> &PriceInput {
        &self.input
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Current price, or `None` when the cost is zero
    pub fn result(&self) -> Option<&PriceResult> {
        self.result.as_ref()
    }

    /// Unit price times quantity, for display
    ///
    /// `None` without a price or when the product leaves the decimal range.
    pub fn line_total(&self) -> Option<Decimal> {
        self.result.and_then(|r| r.line_total(self.quantity))
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown::new(&self.input, self.result.as_ref())
    }

    /// Whether a commit would be accepted right now
    pub fn can_commit(&self) -> bool {
        self.ledger
            .check_commit(
                self.editing.as_ref(),
                &self.product_id,
                self.result.as_ref(),
                self.quantity,
            )
            .is_ok()
    }

    pub fn editing(&self) -> Option<&ItemId> {
        self.editing.as_ref()
    }

    pub fn ledger(&self) -> &ItemLedger {
        &self.ledger
    }

    /// Ledger total, `None` if restored items overflow it
    pub fn total(&self) -> Option<Decimal> {
        self.ledger.total()
    }

    pub fn metrics(&self) -> &CalculatorMetrics {
        &self.metrics
    }

    // ------------------------------------------------------------------
    // Ledger actions
    // ------------------------------------------------------------------

    /// Add the current entry, or save it over the item being edited
    ///
    /// On success the entry fields are cleared and edit mode ends. On
    /// rejection nothing changes.
    ///
    /// A storage error is returned after the ledger has already changed: the
    /// item stays committed and the entry stays cleared, only the saved copy
    /// is stale. The next successful save writes the full state again.
    pub fn commit(&mut self) -> CalcResult<LedgerItem> {
        let outcome = match self.editing.clone() {
            Some(item_id) => self.ledger.edit(
                &item_id,
                &self.product_id,
                self.input.clone(),
                self.result.as_ref(),
                self.quantity,
            ),
            None => self.ledger.add(
                &self.product_id,
                self.input.clone(),
                self.result.as_ref(),
                self.quantity,
            ),
        };

        let item = match outcome {
            Ok(item) => item,
            Err(err) => {
                self.metrics.record_rejected_commit();
                if let CalculatorError::NotFound(_) = err {
                    // Target vanished underneath us; leave edit mode
                    self.editing = None;
                }
                return Err(err);
            }
        };

        if self.editing.take().is_some() {
            self.metrics.record_edit();
        } else {
            self.metrics.record_commit();
        }
        self.clear_entry();
        self.persist()?;
        Ok(item)
    }

    /// Load an item into the entry fields and enter edit mode
    pub fn begin_edit(&mut self, item_id: &ItemId) -> CalcResult<()> {
        let item = self
            .ledger
            .get(item_id)
            .cloned()
            .ok_or_else(|| CalculatorError::NotFound(item_id.clone()))?;

        if let Some(previous) = self.editing.replace(item.item_id.clone()) {
            tracing::debug!("Switching edit from item {} to {}", previous, item.item_id);
        }
        self.input = item.input;
        self.quantity = item.quantity;
        self.product_id = item.product_id;
        self.recompute();
        self.persist()
    }

    /// Leave edit mode and clear the entry fields
    pub fn cancel_edit(&mut self) -> CalcResult<()> {
        if self.editing.take().is_some() {
            self.clear_entry();
            self.persist()?;
        }
        Ok(())
    }

    /// Remove an item; removing a missing id changes nothing
    pub fn remove_item(&mut self, item_id: &ItemId) -> CalcResult<Option<LedgerItem>> {
        let removed = self.ledger.remove(item_id);
        if removed.is_none() {
            return Ok(None);
        }

        self.metrics.record_removal();
        if self.editing.as_ref() == Some(item_id) {
            self.editing = None;
            self.clear_entry();
        }
        self.persist()?;
        Ok(removed)
    }

    /// Empty the ledger and leave edit mode
    pub fn clear_all(&mut self) -> CalcResult<()> {
        self.ledger.clear_all();
        self.metrics.record_clear();
        if self.editing.take().is_some() {
            self.clear_entry();
        }
        self.persist()
    }

    /// Clear every entry field and forget them in storage
    ///
    /// Saved items are kept.
    pub fn reset(&mut self) -> CalcResult<()> {
        self.editing = None;
        self.clear_entry();
        if let Some(storage) = self.storage.as_mut() {
            clear_form_state(storage.store.as_mut(), &storage.keys)?;
        }
        tracing::info!("Calculator reset");
        Ok(())
    }
}

impl Default for CalculatorForm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CalculatorForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatorForm")
            .field("input", &self.input)
            .field("quantity", &self.quantity)
            .field("product_id", &self.product_id)
            .field("result", &self.result)
            .field("ledger", &self.ledger)
            .field("editing", &self.editing)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}
