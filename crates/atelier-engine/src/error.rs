//! Error types for booking operations.

use thiserror::Error;

/// Errors surfaced by the booking engine.
///
/// Every variant is raised before any write happens, so a failed operation
/// leaves the store untouched.
#[derive(Error, Debug)]
pub enum BookingError {
    /// A required field is missing or malformed (e.g. a date that is not ISO).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The shift or order window is already fully booked.
    #[error("Capacity exceeded: {window}")]
    CapacityExceeded { window: String },

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    /// A customer with the same tax ID or phone is already registered.
    #[error("Customer already registered with this {field}")]
    DuplicateCustomer { field: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The persistent store failed (e.g. a poisoned lock).
    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BookingError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(kind: &'static str, id: u64) -> Self {
        Self::NotFound { kind, id }
    }
}

/// Convenience alias used throughout atelier-engine.
pub type Result<T> = std::result::Result<T, BookingError>;
