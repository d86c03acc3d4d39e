//! Account registry logic.
//!
//! This module implements the account side of the ledger:
//! - Account and owner domain types
//! - Balance mutation guards (no overdraw, no overflow)
//! - Creation and unregistration validation
//! - Sequential account-number assignment
//! - Error types for account operations

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::AccountError;
pub use service::{AccountService, MAX_ACCOUNTS_PER_USER};
pub use types::{Account, AccountStatus, AccountUser};
