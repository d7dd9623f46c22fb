//! Domain error types.

use thiserror::Error;

/// Errors raised by domain value types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Unknown enum value when parsing a stored or submitted value.
    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// Invalid identifier text.
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}
