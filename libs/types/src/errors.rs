//! Error types shared by the ledger and market
//!
//! Numeric and parsing failures, using thiserror

use thiserror::Error;

/// Checked fixed-point arithmetic failure.
///
/// Amounts never wrap: any operation that would leave the representable
/// range fails with one of these instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,
}

/// Failure to parse an identifier or amount from its textual form
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_error_display() {
        assert_eq!(ArithmeticError::Overflow.to_string(), "Arithmetic overflow");
        assert_eq!(ArithmeticError::Underflow.to_string(), "Arithmetic underflow");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::InvalidAmount {
            input: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert!(err.to_string().contains("abc"));
        assert!(err.to_string().contains("not a number"));
    }
}
