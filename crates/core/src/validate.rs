//! Field validation helpers shared by the domain modules.
//!
//! Inputs arrive signed so that a negative or zero value is reported against
//! its field instead of failing to parse.

use crate::error::{DomainError, DomainResult};

/// Require a strictly positive integer.
pub fn positive(field: &str, value: i64) -> DomainResult<u64> {
    if value <= 0 {
        return Err(DomainError::validation(field, "must be greater than zero"));
    }
    Ok(value as u64)
}

/// Require a non-negative integer.
pub fn non_negative(field: &str, value: i64) -> DomainResult<u64> {
    u64::try_from(value).map_err(|_| DomainError::validation(field, "cannot be negative"))
}

/// Require a string with at least one non-whitespace character.
pub fn non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "cannot be empty"));
    }
    Ok(())
}

/// `quantity * unit_price`, reporting overflow against `field`.
pub fn line_total(field: &str, quantity: u64, unit_price: u64) -> DomainResult<u64> {
    quantity
        .checked_mul(unit_price)
        .ok_or_else(|| DomainError::validation(field, "total price overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(positive("quantity", 0).is_err());
        assert!(positive("quantity", -3).is_err());
        assert_eq!(positive("quantity", 4).unwrap(), 4);
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert_eq!(non_negative("quantity", 0).unwrap(), 0);
        match non_negative("quantity", -1).unwrap_err() {
            DomainError::Validation { field, .. } => assert_eq!(field, "quantity"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(non_blank("name", "   ").is_err());
        assert!(non_blank("name", "Rice").is_ok());
    }

    #[test]
    fn line_total_detects_overflow() {
        assert_eq!(line_total("total_price", 4, 5).unwrap(), 20);
        assert!(line_total("total_price", u64::MAX, 2).is_err());
    }
}
