// Error types for the buy cost calculator
// Covers rejected commits, missing ledger items, and storage failures

use std::fmt;
use thiserror::Error;

use crate::ledger::ItemId;

/// Why a commit (add or edit) was refused
///
/// A rejected commit never mutates the ledger. The calculator surfaces these
/// as a disabled commit action rather than a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Product identifier is empty or whitespace-only
    MissingProductId,

    /// No price result is available (cost parsed to zero)
    MissingPrice,

    /// Quantity must be a positive integer
    InvalidQuantity,

    /// Line total or ledger total would exceed the decimal range
    AmountOutOfRange,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MissingProductId => "missing_product_id",
            RejectReason::MissingPrice => "missing_price",
            RejectReason::InvalidQuantity => "invalid_quantity",
            RejectReason::AmountOutOfRange => "amount_out_of_range",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingProductId => write!(f, "product id is required"),
            RejectReason::MissingPrice => write!(f, "no price has been calculated"),
            RejectReason::InvalidQuantity => write!(f, "quantity must be at least 1"),
            RejectReason::AmountOutOfRange => write!(f, "total is out of range"),
        }
    }
}

/// Main error type for the calculator
///
/// Nothing in the pricing core is fatal: malformed numbers are coerced to
/// zero before they ever reach this type. Errors only arise from commit
/// gating, missing edit targets, and the storage collaborator.
#[derive(Debug, Error)]
pub enum CalculatorError {
    /// Commit attempted with a missing price or product identifier
    #[error("Commit rejected: {0}")]
    Rejected(RejectReason),

    /// Edit target does not exist in the ledger
    #[error("Ledger item not found: {0}")]
    NotFound(ItemId),

    /// Storage backend I/O failure
    /// Automatically converted from std::io::Error
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Persisted state could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type alias for calculator operations
pub type CalcResult<T> = Result<T, CalculatorError>;

impl From<RejectReason> for CalculatorError {
    fn from(reason: RejectReason) -> Self {
        CalculatorError::Rejected(reason)
    }
}

impl From<validator::ValidationErrors> for CalculatorError {
    fn from(err: validator::ValidationErrors) -> Self {
        CalculatorError::InvalidConfiguration(err.to_string())
    }
}

impl CalculatorError {
    /// True when the error came from commit gating rather than a failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, CalculatorError::Rejected(_))
    }
}
