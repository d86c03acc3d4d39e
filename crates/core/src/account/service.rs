//! Account registry validation and numbering.
//!
//! This service contains pure business logic with no storage dependencies.
//! The storage layer resolves rows and hands them in; these functions decide.

use tally_shared::{AccountNumber, UserId};

use super::error::AccountError;
use super::types::Account;

/// Maximum number of accounts a single user may own.
pub const MAX_ACCOUNTS_PER_USER: usize = 10;

/// Stateless account registry service.
pub struct AccountService;

impl AccountService {
    /// Validates that a user may open another account.
    ///
    /// `owned_accounts` counts every account the user owns, unregistered ones
    /// included, matching how the limit has always been enforced.
    ///
    /// # Errors
    ///
    /// Returns `MaxAccountsPerUser` at the ownership limit and
    /// `InvalidInitialBalance` for a negative starting balance.
    pub fn validate_create_account(
        owned_accounts: usize,
        initial_balance: i64,
    ) -> Result<(), AccountError> {
        if owned_accounts >= MAX_ACCOUNTS_PER_USER {
            return Err(AccountError::MaxAccountsPerUser);
        }
        if initial_balance < 0 {
            return Err(AccountError::InvalidInitialBalance(initial_balance));
        }
        Ok(())
    }

    /// Computes the number for the next account.
    ///
    /// The successor of the highest assigned number, or `AccountNumber::FIRST`
    /// on an empty registry.
    ///
    /// # Errors
    ///
    /// Returns `NumberSpaceExhausted` when the ten-digit space is spent.
    pub fn next_account_number(
        highest: Option<AccountNumber>,
    ) -> Result<AccountNumber, AccountError> {
        match highest {
            None => Ok(AccountNumber::FIRST),
            Some(number) => number
                .successor()
                .map_err(|_| AccountError::NumberSpaceExhausted),
        }
    }

    /// Validates that `user_id` may unregister `account`.
    ///
    /// The state transition itself is [`Account::unregister`]; this checks the
    /// requester's claim on the account first.
    ///
    /// # Errors
    ///
    /// Returns `OwnerMismatch`, `AccountUnregistered`, or `BalanceNotEmpty`
    /// in that order of precedence.
    pub fn validate_delete_account(user_id: UserId, account: &Account) -> Result<(), AccountError> {
        if account.owner_id != user_id {
            return Err(AccountError::OwnerMismatch {
                user_id,
                account_number: account.account_number,
            });
        }
        if !account.is_in_use() {
            return Err(AccountError::AccountUnregistered(account.account_number));
        }
        if account.balance > 0 {
            return Err(AccountError::BalanceNotEmpty(account.account_number));
        }
        Ok(())
    }
}
