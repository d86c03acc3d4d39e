//! Balance transaction logic.
//!
//! This module implements the ledger side of the system:
//! - Immutable audit records for every attempted use/cancel
//! - The caller-facing transaction token
//! - Validation for balance use and compensating cancel
//! - Error types for transaction operations

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::TransactionError;
pub use service::TransactionService;
pub use types::{Transaction, TransactionResult, TransactionToken, TransactionType};
