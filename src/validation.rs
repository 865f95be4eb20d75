// Validation utilities module
// Provides custom validation functions for commit gating and configuration

use validator::ValidationError;

/// Validates that a product id has at least one non-whitespace character
pub fn validate_product_id(product_id: &str) -> Result<(), ValidationError> {
    if product_id.trim().is_empty() {
        Err(ValidationError::new("product_id_required"))
    } else {
        Ok(())
    }
}

/// Validates that a quantity is a positive integer
pub fn validate_quantity(quantity: u32) -> Result<(), ValidationError> {
    if quantity == 0 {
        Err(ValidationError::new("quantity_must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates that a storage key prefix is non-blank and has no whitespace
pub fn validate_storage_prefix(prefix: &str) -> Result<(), ValidationError> {
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        Err(ValidationError::new("invalid_storage_prefix"))
    } else {
        Ok(())
    }
}
