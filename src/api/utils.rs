//! API utility functions
//!
//! Contains helper functions used by API handlers for validation.

use crate::error::AppError;

/// Validate query string
///
/// # Arguments
/// * `query` - Query string to validate
/// * `max_length` - Maximum length in characters
///
/// # Returns
/// * `Ok(())` - Query is valid
/// * `Err(AppError)` - Query is invalid (empty or too long)
pub fn validate_query(query: &str, max_length: usize) -> Result<(), AppError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
    }
    let length = trimmed.chars().count();
    if length > max_length {
        return Err(AppError::QueryTooLong {
            length,
            max: max_length,
        });
    }
    Ok(())
}
