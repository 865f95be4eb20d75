use rust_decimal::Decimal;
use std::fmt;

use crate::error::{CalcResult, CalculatorError, RejectReason};
use crate::ledger::id_source::{ItemIdSource, SequentialIds};
use crate::ledger::models::{ItemId, LedgerItem};
use crate::pricing::{PriceInput, PriceResult};
use crate::validation::{validate_product_id, validate_quantity};

/// Ordered collection of committed items
///
/// Insertion order is display order. The ledger does not track which item
/// is being edited; that is left to the caller.
pub struct ItemLedger {
    items: Vec<LedgerItem>,
    ids: Box<dyn ItemIdSource>,
}

impl ItemLedger {
    /// Create an empty ledger with sequential ids
    pub fn new() -> Self {
        Self::with_id_source(Box::new(SequentialIds::new()))
    }

    pub fn with_id_source(ids: Box<dyn ItemIdSource>) -> Self {
        Self {
            items: Vec::new(),
            ids,
        }
    }

    /// Check the commit gate shared by add and edit
    ///
    /// `replacing` names the item an edit overwrites; its old line is left
    /// out of the range check on the ledger total.
    pub(crate) fn check_commit(
        &self,
        replacing: Option<&ItemId>,
        product_id: &str,
        result: Option<&PriceResult>,
        quantity: u32,
    ) -> Result<Decimal, RejectReason> {
        validate_product_id(product_id).map_err(|_| RejectReason::MissingProductId)?;
        let result = result.ok_or(RejectReason::MissingPrice)?;
        validate_quantity(quantity).map_err(|_| RejectReason::InvalidQuantity)?;

        let line = result
            .line_total(quantity)
            .ok_or(RejectReason::AmountOutOfRange)?;
        let others = self
            .items
            .iter()
            .filter(|item| Some(&item.item_id) != replacing);
        sum_lines(others)
            .and_then(|sum| sum.checked_add(line))
            .ok_or(RejectReason::AmountOutOfRange)?;

        Ok(result.unit_price)
    }

    fn fresh_id(&mut self) -> ItemId {
        loop {
            let id = self.ids.next_id();
            if !self.contains(&id) {
                return id;
            }
            tracing::warn!("Id source produced duplicate id {}, drawing another", id);
        }
    }

    /// Append a new item to the end of the ledger
    ///
    /// Rejected when the product id is blank, the price is absent, the
    /// quantity is zero, or the line would push the total out of range. A
    /// rejected add leaves the ledger untouched.
    pub fn add(
        &mut self,
        product_id: &str,
        input: PriceInput,
        result: Option<&PriceResult>,
        quantity: u32,
    ) -> CalcResult<LedgerItem> {
        let unit_price = self
            .check_commit(None, product_id, result, quantity)
            .map_err(|reason| {
                tracing::debug!("Rejected add for product {:?}: {}", product_id, reason);
                CalculatorError::Rejected(reason)
            })?;

        let item = LedgerItem {
            item_id: self.fresh_id(),
            product_id: product_id.to_string(),
            input,
            unit_price,
            quantity,
        };

        tracing::info!(
            "Added item {} for product {} at {} x {}",
            item.item_id,
            item.product_id,
            item.unit_price,
            item.quantity
        );
        self.items.push(item.clone());
        Ok(item)
    }

    /// Replace an item's fields in place, keeping its id and position
    ///
    /// Same gate as `add`; a missing `item_id` is reported as `NotFound`.
    pub fn edit(
        &mut self,
        item_id: &ItemId,
        product_id: &str,
        input: PriceInput,
        result: Option<&PriceResult>,
        quantity: u32,
    ) -> CalcResult<LedgerItem> {
        let unit_price = self
            .check_commit(Some(item_id), product_id, result, quantity)
            .map_err(|reason| {
                tracing::debug!("Rejected edit of item {}: {}", item_id, reason);
                CalculatorError::Rejected(reason)
            })?;

        let item = self
            .items
            .iter_mut()
            .find(|item| &item.item_id == item_id)
            .ok_or_else(|| {
                tracing::debug!("Item {} not found for edit", item_id);
                CalculatorError::NotFound(item_id.clone())
            })?;

        item.product_id = product_id.to_string();
        item.input = input;
        item.unit_price = unit_price;
        item.quantity = quantity;

        tracing::info!("Updated item {} ({})", item.item_id, item.product_id);
        Ok(item.clone())
    }

    /// Delete an item if present
    ///
    /// Idempotent: removing a missing id is a no-op and returns `None`.
    pub fn remove(&mut self, item_id: &ItemId) -> Option<LedgerItem> {
        let position = self.items.iter().position(|item| &item.item_id == item_id)?;
        let removed = self.items.remove(position);
        tracing::info!("Removed item {} ({})", removed.item_id, removed.product_id);
        Some(removed)
    }

    /// Empty the ledger
    pub fn clear_all(&mut self) {
        let count = self.items.len();
        self.items.clear();
        tracing::info!("Cleared {} items from ledger", count);
    }

    /// Sum of unit price times quantity over all items
    ///
    /// `None` when the sum leaves the decimal range. Commits never get there,
    /// but restored items are taken as stored.
    pub fn total(&self) -> Option<Decimal> {
        sum_lines(self.items.iter())
    }

    /// Replace the whole collection, e.g. with items loaded from storage
    pub fn restore(&mut self, items: Vec<LedgerItem>) {
        for item in &items {
            self.ids.observe(&item.item_id);
        }
        tracing::debug!("Restored {} ledger items", items.len());
        self.items = items;
    }

    pub fn get(&self, item_id: &ItemId) -> Option<&LedgerItem> {
        self.items.iter().find(|item| &item.item_id == item_id)
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.get(item_id).is_some()
    }

    pub fn items(&self) -> &[LedgerItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn sum_lines<'a>(mut items: impl Iterator<Item = &'a LedgerItem>) -> Option<Decimal> {
    items.try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
}

impl Default for ItemLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ItemLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemLedger")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingEngine;
    use rust_decimal_macros::dec;

    fn priced(cost: &str) -> (PriceInput, Option<PriceResult>) {
        let input = PriceInput::new(cost, "", "", "");
        let result = PricingEngine::compute(&input);
        (input, result)
    }

    fn ledger_with(costs: &[&str]) -> ItemLedger {
        let mut ledger = ItemLedger::new();
        for (index, cost) in costs.iter().enumerate() {
            let (input, result) = priced(cost);
            ledger
                .add(&format!("SKU-{}", index), input, result.as_ref(), 1)
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_add_appends_in_order() {
        let ledger = ledger_with(&["10", "20", "30"]);
        let products: Vec<&str> = ledger.items().iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(products, vec!["SKU-0", "SKU-1", "SKU-2"]);
        assert_eq!(ledger.items()[0].item_id, ItemId::from("1"));
        assert_eq!(ledger.items()[2].item_id, ItemId::from("3"));
    }

    #[test]
    fn test_add_snapshots_unit_price() {
        let mut ledger = ItemLedger::new();
        let input = PriceInput::new("100", "10", "10", "");
        let result = PricingEngine::compute(&input);
        let item = ledger.add("B00X", input.clone(), result.as_ref(), 2).unwrap();

        assert_eq!(item.unit_price, dec!(99));
        assert_eq!(item.quantity, 2);
        assert_eq!(item.input, input);
    }

    #[test]
    fn test_add_rejects_blank_product_id() {
        let mut ledger = ItemLedger::new();
        let (input, result) = priced("10");

        for blank in ["", "   ", "\t"] {
            let err = ledger.add(blank, input.clone(), result.as_ref(), 1).unwrap_err();
            assert!(matches!(err, CalculatorError::Rejected(RejectReason::MissingProductId)));
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_rejects_missing_price() {
        let mut ledger = ItemLedger::new();
        let (input, result) = priced("0");
        assert!(result.is_none());

        let err = ledger.add("SKU", input, result.as_ref(), 1).unwrap_err();
        assert!(matches!(err, CalculatorError::Rejected(RejectReason::MissingPrice)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut ledger = ItemLedger::new();
        let (input, result) = priced("10");
        let err = ledger.add("SKU", input, result.as_ref(), 0).unwrap_err();
        assert!(matches!(err, CalculatorError::Rejected(RejectReason::InvalidQuantity)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_edit_preserves_id_and_position() {
        let mut ledger = ledger_with(&["10", "20", "30"]);
        let target = ledger.items()[1].item_id.clone();
        let (input, result) = priced("25");

        let edited = ledger.edit(&target, "RENAMED", input, result.as_ref(), 4).unwrap();

        assert_eq!(edited.item_id, target);
        assert_eq!(ledger.items()[1].item_id, target);
        assert_eq!(ledger.items()[1].product_id, "RENAMED");
        assert_eq!(ledger.items()[1].unit_price, dec!(25));
        assert_eq!(ledger.items()[1].quantity, 4);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_edit_missing_item_is_not_found() {
        let mut ledger = ledger_with(&["10"]);
        let (input, result) = priced("25");
        let missing = ItemId::from("999");

        let err = ledger.edit(&missing, "SKU", input, result.as_ref(), 1).unwrap_err();
        assert!(matches!(err, CalculatorError::NotFound(ref id) if id == &missing));
        assert_eq!(ledger.items()[0].unit_price, dec!(10));
    }

    #[test]
    fn test_edit_rejection_leaves_item_untouched() {
        let mut ledger = ledger_with(&["10"]);
        let target = ledger.items()[0].item_id.clone();
        let before = ledger.items()[0].clone();
        let (input, result) = priced("0");

        let err = ledger.edit(&target, "SKU", input, result.as_ref(), 1).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(ledger.items()[0], before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut ledger = ledger_with(&["10", "20"]);
        let target = ledger.items()[0].item_id.clone();

        assert!(ledger.remove(&target).is_some());
        let after_once: Vec<LedgerItem> = ledger.items().to_vec();
        assert!(ledger.remove(&target).is_none());
        assert_eq!(ledger.items(), after_once.as_slice());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_clear_all() {
        let mut ledger = ledger_with(&["10", "20"]);
        ledger.clear_all();
        assert!(ledger.is_empty());
        assert_eq!(ledger.total(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_total_uses_quantity() {
        let mut ledger = ItemLedger::new();
        let (input, result) = priced("2.50");
        ledger.add("A", input, result.as_ref(), 4).unwrap();
        let (input, result) = priced("1.25");
        ledger.add("B", input, result.as_ref(), 1).unwrap();

        assert_eq!(ledger.total(), Some(dec!(11.25)));
    }

    #[test]
    fn test_add_rejects_line_total_out_of_range() {
        let mut ledger = ItemLedger::new();
        let (input, result) = priced("5e28");
        assert!(result.is_some());

        let err = ledger.add("SKU", input.clone(), result.as_ref(), 2).unwrap_err();
        assert!(matches!(err, CalculatorError::Rejected(RejectReason::AmountOutOfRange)));
        assert!(ledger.is_empty());

        ledger.add("SKU", input, result.as_ref(), 1).unwrap();
        assert_eq!(ledger.total(), result.map(|r| r.unit_price));
    }

    #[test]
    fn test_add_rejects_ledger_total_out_of_range() {
        let mut ledger = ItemLedger::new();
        let (input, result) = priced("5e28");
        ledger.add("A", input.clone(), result.as_ref(), 1).unwrap();

        let err = ledger.add("B", input, result.as_ref(), 1).unwrap_err();
        assert!(matches!(err, CalculatorError::Rejected(RejectReason::AmountOutOfRange)));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.total().is_some());
    }

    #[test]
    fn test_edit_range_check_ignores_replaced_line() {
        let mut ledger = ItemLedger::new();
        let (input, result) = priced("5e28");
        let item = ledger.add("A", input.clone(), result.as_ref(), 1).unwrap();

        // The old line is replaced, not added to
        let edited = ledger.edit(&item.item_id, "A2", input.clone(), result.as_ref(), 1).unwrap();
        assert_eq!(edited.product_id, "A2");

        let err = ledger.edit(&item.item_id, "A3", input, result.as_ref(), 2).unwrap_err();
        assert!(matches!(err, CalculatorError::Rejected(RejectReason::AmountOutOfRange)));
        assert_eq!(ledger.items()[0].product_id, "A2");
    }

    #[test]
    fn test_total_of_restored_items_out_of_range() {
        let huge = Decimal::MAX;
        let item = |id: &str, quantity: u32| LedgerItem {
            item_id: ItemId::from(id),
            product_id: "SKU".to_string(),
            input: PriceInput::new(huge.to_string(), "", "", ""),
            unit_price: huge,
            quantity,
        };

        let mut ledger = ItemLedger::new();
        ledger.restore(vec![item("1", 2)]);
        assert_eq!(ledger.total(), None);

        ledger.restore(vec![item("1", 1), item("2", 1)]);
        assert_eq!(ledger.total(), None);

        ledger.restore(vec![item("1", 1)]);
        assert_eq!(ledger.total(), Some(huge));
    }

    #[test]
    fn test_ids_stay_unique_after_removal() {
        let mut ledger = ledger_with(&["10", "20"]);
        let last = ledger.items()[1].item_id.clone();
        ledger.remove(&last);
        let (input, result) = priced("30");
        let item = ledger.add("C", input, result.as_ref(), 1).unwrap();
        assert_eq!(item.item_id, ItemId::from("3"));
    }

    #[test]
    fn test_restore_reseeds_ids() {
        let source = ledger_with(&["10", "20", "30"]);
        let mut ledger = ItemLedger::new();
        ledger.restore(source.items().to_vec());

        let (input, result) = priced("5");
        let item = ledger.add("NEW", input, result.as_ref(), 1).unwrap();
        assert_eq!(item.item_id, ItemId::from("4"));
        assert_eq!(ledger.len(), 4);
    }

    #[test]
    fn test_duplicate_ids_from_source_are_skipped() {
        struct Repeating(u32);
        impl ItemIdSource for Repeating {
            fn next_id(&mut self) -> ItemId {
                self.0 += 1;
                ItemId::new(((self.0 + 1) / 2).to_string())
            }
        }

        let mut ledger = ItemLedger::with_id_source(Box::new(Repeating(0)));
        for product in ["A", "B", "C"] {
            let (input, result) = priced("1");
            ledger.add(product, input, result.as_ref(), 1).unwrap();
        }
        let ids: Vec<&str> = ledger.items().iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::pricing::PricingEngine;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add { cost_cents: u32, quantity: u32 },
        Edit { index: usize, cost_cents: u32, quantity: u32 },
        Remove { index: usize },
        RejectedAdd,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..=100_000, 1u32..=20)
                .prop_map(|(cost_cents, quantity)| Op::Add { cost_cents, quantity }),
            (0usize..10, 1u32..=100_000, 1u32..=20).prop_map(|(index, cost_cents, quantity)| {
                Op::Edit { index, cost_cents, quantity }
            }),
            (0usize..10).prop_map(|index| Op::Remove { index }),
            Just(Op::RejectedAdd),
        ]
    }

    fn priced(cost_cents: u32) -> (PriceInput, Option<PriceResult>) {
        let input = PriceInput::new(
            (Decimal::from(cost_cents) / Decimal::ONE_HUNDRED).to_string(),
            "5",
            "7.5",
            "0.30",
        );
        let result = PricingEngine::compute(&input);
        (input, result)
    }

    fn expected_total(ledger: &ItemLedger) -> Option<Decimal> {
        let mut total = Decimal::ZERO;
        for item in ledger.items() {
            total = total.checked_add(item.unit_price.checked_mul(Decimal::from(item.quantity))?)?;
        }
        Some(total)
    }

    /// Total always equals the sum of line totals after every operation
    #[test]
    fn prop_total_matches_items_after_every_step() {
        proptest!(|(ops in prop::collection::vec(op_strategy(), 0..40))| {
            let mut ledger = ItemLedger::new();

            for op in ops {
                match op {
                    Op::Add { cost_cents, quantity } => {
                        let (input, result) = priced(cost_cents);
                        let before = ledger.len();
                        let outcome = ledger.add("SKU", input, result.as_ref(), quantity);
                        if cost_cents == 0 {
                            prop_assert!(outcome.is_err());
                            prop_assert_eq!(ledger.len(), before);
                        } else {
                            prop_assert_eq!(ledger.len(), before + 1);
                        }
                    }
                    Op::Edit { index, cost_cents, quantity } => {
                        if let Some(id) = ledger.items().get(index).map(|i| i.item_id.clone()) {
                            let (input, result) = priced(cost_cents);
                            let edited = ledger.edit(&id, "EDITED", input, result.as_ref(), quantity);
                            prop_assert!(edited.is_ok());
                            prop_assert_eq!(&ledger.items()[index].item_id, &id);
                        }
                    }
                    Op::Remove { index } => {
                        if let Some(id) = ledger.items().get(index).map(|i| i.item_id.clone()) {
                            ledger.remove(&id);
                            let snapshot = ledger.items().to_vec();
                            ledger.remove(&id);
                            prop_assert_eq!(ledger.items(), snapshot.as_slice());
                        }
                    }
                    Op::RejectedAdd => {
                        let (input, result) = priced(100);
                        let before = ledger.len();
                        prop_assert!(ledger.add("  ", input, result.as_ref(), 1).is_err());
                        prop_assert_eq!(ledger.len(), before);
                    }
                }

                prop_assert_eq!(ledger.total(), expected_total(&ledger));
            }
        });
    }

    /// Costs near the top of the decimal range are refused rather than overflowing
    #[test]
    fn prop_large_commits_keep_total_in_range() {
        proptest!(|(rows in prop::collection::vec((1u32..=79_228, 1u32..=u32::MAX), 1..6))| {
            let mut ledger = ItemLedger::new();

            for (mantissa, quantity) in rows {
                let input = PriceInput::new(format!("{}e24", mantissa), "", "", "");
                let result = PricingEngine::compute(&input);
                let before = ledger.len();

                match ledger.add("SKU", input, result.as_ref(), quantity) {
                    Ok(_) => prop_assert_eq!(ledger.len(), before + 1),
                    Err(err) => {
                        prop_assert!(matches!(
                            err,
                            CalculatorError::Rejected(RejectReason::AmountOutOfRange)
                        ));
                        prop_assert_eq!(ledger.len(), before);
                    }
                }

                prop_assert!(ledger.total().is_some());
                prop_assert_eq!(ledger.total(), expected_total(&ledger));
            }
        });
    }

    /// Restored items are summed without panicking, whatever their size
    #[test]
    fn prop_restored_total_never_panics() {
        proptest!(|(rows in prop::collection::vec((1u32..=1_000, any::<u32>()), 0..6))| {
            let items: Vec<LedgerItem> = rows
                .into_iter()
                .enumerate()
                .map(|(index, (divisor, quantity))| LedgerItem {
                    item_id: ItemId::new((index + 1).to_string()),
                    product_id: "SKU".to_string(),
                    input: PriceInput::default(),
                    unit_price: Decimal::MAX / Decimal::from(divisor),
                    quantity,
                })
                .collect();

            let mut ledger = ItemLedger::new();
            ledger.restore(items);
            prop_assert_eq!(ledger.total(), expected_total(&ledger));
        });
    }

    /// Item ids are never reused within a ledger
    #[test]
    fn prop_item_ids_unique() {
        proptest!(|(count in 1usize..30, removals in prop::collection::vec(0usize..30, 0..10))| {
            let mut ledger = ItemLedger::new();
            for _ in 0..count {
                let (input, result) = priced(100);
                ledger.add("SKU", input, result.as_ref(), 1).unwrap();
            }
            for index in removals {
                if let Some(id) = ledger.items().get(index).map(|i| i.item_id.clone()) {
                    ledger.remove(&id);
                }
                let (input, result) = priced(100);
                ledger.add("SKU", input, result.as_ref(), 1).unwrap();
            }

            let mut ids: Vec<&ItemId> = ledger.items().iter().map(|i| &i.item_id).collect();
            let before = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), before);
        });
    }
}
