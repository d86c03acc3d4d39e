//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and balance arithmetic
//! live here.
//!
//! # Modules
//!
//! - `account` - Account registry: creation, numbering, lifecycle
//! - `transaction` - Balance use/cancel validation and the audit record model

pub mod account;
pub mod transaction;
