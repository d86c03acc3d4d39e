//! Property-based tests for transaction validation.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use tally_shared::{AccountNumber, UserId};

use crate::account::Account;

use super::error::TransactionError;
use super::service::TransactionService;
use super::types::{Transaction, TransactionResult, TransactionType};

fn test_account(balance: i64) -> Account {
    Account::open(UserId::new(), AccountNumber::FIRST, balance, Utc::now())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Validation admits a use exactly when 0 < amount <= balance.
    #[test]
    fn prop_use_admitted_iff_within_balance(
        balance in 0i64..1_000_000i64,
        amount in -1_000i64..2_000_000i64,
    ) {
        let account = test_account(balance);
        let result = TransactionService::validate_use(account.owner_id, &account, amount);

        if amount > 0 && amount <= balance {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// A cancel for any amount other than the original is rejected, and the
    /// rejection carries both amounts.
    #[test]
    fn prop_cancel_requires_exact_amount(
        original_amount in 1i64..1_000_000i64,
        cancel_amount in 1i64..1_000_000i64,
    ) {
        let account = test_account(1_000_000);
        let now = Utc::now();
        let original = Transaction::record(
            TransactionType::Use,
            TransactionResult::Success,
            &account,
            original_amount,
            now,
        );

        let result = TransactionService::validate_cancel(&original, &account, cancel_amount, now);
        if cancel_amount == original_amount {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(
                result.unwrap_err(),
                TransactionError::AmountMismatch { original_amount, cancel_amount }
            );
        }
    }

    /// The one-year window is a hard cutoff: ages comfortably past it are
    /// always rejected, recent ages always pass.
    #[test]
    fn prop_cancel_window_cutoff(age_days in 0i64..2_000i64) {
        let account = test_account(1_000_000);
        let now = Utc::now();
        let original = Transaction::record(
            TransactionType::Use,
            TransactionResult::Success,
            &account,
            500,
            now - Duration::days(age_days),
        );

        let result = TransactionService::validate_cancel(&original, &account, 500, now);
        // A 12-month window is 365 or 366 days depending on the year; stay
        // clear of the boundary on both sides.
        if age_days <= 364 {
            prop_assert!(result.is_ok());
        } else if age_days >= 367 {
            prop_assert_eq!(result.unwrap_err(), TransactionError::TooOldToCancel);
        }
    }
}
