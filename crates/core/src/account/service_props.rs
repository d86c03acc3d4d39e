//! Property-based tests for the account registry.

use chrono::Utc;
use proptest::prelude::*;
use tally_shared::{AccountNumber, UserId};

use super::error::AccountError;
use super::service::AccountService;
use super::types::Account;

/// Strategy to generate debit amounts, positive and occasionally oversized.
fn debit_amount() -> impl Strategy<Value = i64> {
    1i64..2_000i64
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// For any allocation count, sequential assignment from an empty registry
    /// yields strictly increasing, gap-free numbers starting at FIRST.
    #[test]
    fn prop_number_assignment_is_dense_and_increasing(count in 1usize..300) {
        let mut highest: Option<AccountNumber> = None;
        let mut previous: Option<AccountNumber> = None;

        for _ in 0..count {
            let next = AccountService::next_account_number(highest).unwrap();
            if let Some(prev) = previous {
                prop_assert!(next > prev);
                prop_assert_eq!(prev.successor().unwrap(), next);
            } else {
                prop_assert_eq!(next, AccountNumber::FIRST);
            }
            previous = Some(next);
            highest = Some(next);
        }
    }

    /// For any sequence of debit attempts, the balance never goes negative and
    /// always equals the initial balance minus the successfully applied sum.
    #[test]
    fn prop_balance_never_negative(
        initial in 0i64..1_000_000i64,
        amounts in prop::collection::vec(debit_amount(), 0..64),
    ) {
        let mut account = Account::open(UserId::new(), AccountNumber::FIRST, initial, Utc::now());
        let mut applied: i64 = 0;

        for amount in amounts {
            match account.use_balance(amount) {
                Ok(()) => applied += amount,
                Err(AccountError::AmountExceedsBalance { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
            prop_assert!(account.balance >= 0);
        }

        prop_assert_eq!(account.balance, initial - applied);
    }

    /// Compensating a debit with a cancel of the same amount restores the
    /// balance exactly.
    #[test]
    fn prop_use_then_cancel_round_trips(
        initial in 0i64..1_000_000i64,
        amount in 1i64..1_000i64,
    ) {
        let mut account = Account::open(UserId::new(), AccountNumber::FIRST, initial, Utc::now());

        if account.use_balance(amount).is_ok() {
            account.cancel_balance(amount).unwrap();
            prop_assert_eq!(account.balance, initial);
        } else {
            prop_assert!(amount > initial);
            prop_assert_eq!(account.balance, initial);
        }
    }
}
