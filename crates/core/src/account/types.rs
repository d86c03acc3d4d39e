//! Account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::{AccountId, AccountNumber, UserId};

use super::error::AccountError;

/// The owner identity referenced by accounts.
///
/// Owners are created by an external identity system; this core reads them
/// and never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUser {
    /// The owner's ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// When the owner was created.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of an account.
///
/// `InUse -> Unregistered` is the only transition and it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// The account is open for transactions.
    InUse,
    /// The account has been closed. Terminal.
    Unregistered,
}

/// A balance-bearing account owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Internal row identifier.
    pub id: AccountId,
    /// The owning user, by identifier only.
    pub owner_id: UserId,
    /// The immutable, sequentially assigned account number.
    pub account_number: AccountNumber,
    /// Current balance in minor units. Never negative.
    pub balance: i64,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// When the account was registered.
    pub registered_at: DateTime<Utc>,
    /// When the account was unregistered, if it has been.
    pub unregistered_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Opens a new account with the given number and starting balance.
    #[must_use]
    pub fn open(
        owner_id: UserId,
        account_number: AccountNumber,
        initial_balance: i64,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            owner_id,
            account_number,
            balance: initial_balance,
            status: AccountStatus::InUse,
            registered_at,
            unregistered_at: None,
        }
    }

    /// Returns true while the account accepts transactions.
    #[must_use]
    pub fn is_in_use(&self) -> bool {
        self.status == AccountStatus::InUse
    }

    /// Debits `amount` from the balance.
    ///
    /// Balance mutation lives on the domain type so no call path can skip the
    /// overdraw guard.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts and
    /// `AmountExceedsBalance` when the debit would overdraw.
    pub fn use_balance(&mut self, amount: i64) -> Result<(), AccountError> {
        if amount <= 0 {
            return Err(AccountError::InvalidAmount(amount));
        }
        if amount > self.balance {
            return Err(AccountError::AmountExceedsBalance {
                amount,
                balance: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Credits `amount` back to the balance, compensating a prior debit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts and `BalanceOverflow`
    /// if the credit would overflow the i64 balance.
    pub fn cancel_balance(&mut self, amount: i64) -> Result<(), AccountError> {
        if amount <= 0 {
            return Err(AccountError::InvalidAmount(amount));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(AccountError::BalanceOverflow)?;
        Ok(())
    }

    /// Transitions the account to `Unregistered`.
    ///
    /// # Errors
    ///
    /// Returns `AccountUnregistered` if already terminal and `BalanceNotEmpty`
    /// while a balance remains.
    pub fn unregister(&mut self, now: DateTime<Utc>) -> Result<(), AccountError> {
        if !self.is_in_use() {
            return Err(AccountError::AccountUnregistered(self.account_number));
        }
        if self.balance > 0 {
            return Err(AccountError::BalanceNotEmpty(self.account_number));
        }
        self.status = AccountStatus::Unregistered;
        self.unregistered_at = Some(now);
        Ok(())
    }
}
