//! Transaction validation for balance use and compensating cancel.
//!
//! This service contains pure business logic with no storage dependencies.
//! The storage layer resolves the rows under the account's exclusion guard
//! and hands them in; these functions decide whether the mutation may happen.

use chrono::{DateTime, Months, Utc};
use tally_shared::UserId;

use crate::account::Account;

use super::error::TransactionError;
use super::types::Transaction;

/// How long a use remains cancellable.
const CANCEL_WINDOW_MONTHS: u32 = 12;

/// Stateless transaction validation service.
pub struct TransactionService;

impl TransactionService {
    /// Validates a balance use against the resolved account.
    ///
    /// Precondition order is fixed: ownership, lifecycle, amount shape,
    /// then sufficiency. The first violation wins and nothing is mutated.
    ///
    /// # Errors
    ///
    /// Returns `OwnerMismatch`, `AccountUnregistered`, `InvalidAmount`, or
    /// `AmountExceedsBalance`.
    pub fn validate_use(
        user_id: UserId,
        account: &Account,
        amount: i64,
    ) -> Result<(), TransactionError> {
        if account.owner_id != user_id {
            return Err(TransactionError::OwnerMismatch {
                user_id,
                account_number: account.account_number,
            });
        }
        if !account.is_in_use() {
            return Err(TransactionError::AccountUnregistered(
                account.account_number,
            ));
        }
        if amount <= 0 {
            return Err(TransactionError::InvalidAmount(amount));
        }
        if amount > account.balance {
            return Err(TransactionError::AmountExceedsBalance {
                amount,
                balance: account.balance,
            });
        }
        Ok(())
    }

    /// Validates a cancel of `original` against the resolved account.
    ///
    /// No partial cancellation: the amount must match the original exactly.
    /// `now` is passed in so the one-year window is testable.
    ///
    /// # Errors
    ///
    /// Returns `TransactionAccountMismatch`, `AmountMismatch`,
    /// `TooOldToCancel`, or `NotCancellable`.
    pub fn validate_cancel(
        original: &Transaction,
        account: &Account,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<(), TransactionError> {
        if original.account_id != account.id {
            return Err(TransactionError::TransactionAccountMismatch {
                transaction_id: original.transaction_id.clone(),
                account_number: account.account_number,
            });
        }
        if original.amount != amount {
            return Err(TransactionError::AmountMismatch {
                original_amount: original.amount,
                cancel_amount: amount,
            });
        }
        if Self::is_too_old(original.transacted_at, now) {
            return Err(TransactionError::TooOldToCancel);
        }
        if !original.is_cancellable() {
            return Err(TransactionError::NotCancellable(
                original.transaction_id.clone(),
            ));
        }
        Ok(())
    }

    fn is_too_old(transacted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.checked_sub_months(Months::new(CANCEL_WINDOW_MONTHS))
            .is_some_and(|cutoff| transacted_at < cutoff)
    }
}
