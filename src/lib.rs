// Buy cost calculator
//
// Prices a seller's unit from cost, discount, sales tax and a flat extra
// cost, and keeps a ledger of priced items with a running total. State can be
// mirrored to any durable key-value store.
//
// - pricing: lenient parsing, the pricing engine, display formatting
// - ledger: committed items, id sources, aggregate total
// - calculator: the interactive session tying both together
// - persistence: key-value stores and state snapshots

pub mod calculator;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod persistence;
pub mod pricing;
pub mod telemetry;
pub mod validation;

pub use calculator::{CalculatorForm, PriceField};
pub use config::CalculatorConfig;
pub use error::{CalcResult, CalculatorError, RejectReason};
pub use ledger::{IdStrategy, ItemId, ItemIdSource, ItemLedger, LedgerItem};
pub use metrics::{CalculatorMetrics, MetricsSummary};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore, StateKeys, StateSnapshot};
pub use pricing::{
    format_currency, parse_decimal_or_zero, PriceBreakdown, PriceInput, PriceResult,
    PricingEngine,
};
