//! Account repository: creation, unregistration, and listing.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use tally_core::account::{Account, AccountError, AccountService};
use tally_shared::{AccountNumber, UserId};

use crate::lock::AccountLockManager;
use crate::memory::MemoryStore;

/// Repository for account lifecycle operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    store: Arc<MemoryStore>,
    locks: Arc<AccountLockManager>,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, locks: Arc<AccountLockManager>) -> Self {
        Self { store, locks }
    }

    /// Opens a new account for `user_id` with the given starting balance.
    ///
    /// Creation is serialized registry-wide: the next account number is the
    /// successor of the highest assigned one, and two concurrent creations
    /// must never read the same maximum.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `MaxAccountsPerUser`, `InvalidInitialBalance`,
    /// or `NumberSpaceExhausted`.
    pub async fn create_account(
        &self,
        user_id: UserId,
        initial_balance: i64,
    ) -> Result<Account, AccountError> {
        self.store
            .find_user(user_id)
            .ok_or(AccountError::UserNotFound(user_id))?;

        let _registration = self.store.registration.lock().await;

        AccountService::validate_create_account(
            self.store.count_accounts_by_owner(user_id),
            initial_balance,
        )?;
        let account_number =
            AccountService::next_account_number(self.store.highest_account_number())?;

        let account = Account::open(user_id, account_number, initial_balance, Utc::now());
        self.store.save_account(account.clone());

        info!(
            %user_id,
            account_number = %account.account_number,
            initial_balance,
            "account registered"
        );
        Ok(account)
    }

    /// Unregisters an account.
    ///
    /// Runs under the account's exclusion guard: the zero-balance check and
    /// the terminal transition must not interleave with an in-flight cancel
    /// crediting the balance back.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `AccountNotFound`, `OwnerMismatch`,
    /// `AccountUnregistered`, `BalanceNotEmpty`, or `LockContention`.
    pub async fn delete_account(
        &self,
        user_id: UserId,
        account_number: AccountNumber,
    ) -> Result<Account, AccountError> {
        self.store
            .find_user(user_id)
            .ok_or(AccountError::UserNotFound(user_id))?;
        self.store
            .find_account(account_number)
            .ok_or(AccountError::AccountNotFound(account_number))?;

        let guard = self.locks.acquire(account_number).await?;

        let mut account = self
            .store
            .find_account(account_number)
            .ok_or(AccountError::AccountNotFound(account_number))?;
        AccountService::validate_delete_account(user_id, &account)?;
        account.unregister(Utc::now())?;
        self.store.save_account(account.clone());
        drop(guard);

        info!(%user_id, account_number = %account.account_number, "account unregistered");
        Ok(account)
    }

    /// Every account the user owns, ordered by account number.
    ///
    /// Unregistered accounts are included; callers project what they need.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user is unknown.
    pub fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, AccountError> {
        self.store
            .find_user(user_id)
            .ok_or(AccountError::UserNotFound(user_id))?;
        Ok(self.store.accounts_by_owner(user_id))
    }
}
