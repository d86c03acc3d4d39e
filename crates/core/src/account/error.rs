//! Account error types for registry and balance-mutation failures.

use tally_shared::{AccountNumber, UserId};
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    // ========== Lookup Errors ==========
    /// Account owner not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Account not found.
    #[error("account not found: {0}")]
    AccountNotFound(AccountNumber),

    // ========== Registry Errors ==========
    /// The user does not own the account.
    #[error("user {user_id} does not own account {account_number}")]
    OwnerMismatch {
        /// The requesting user.
        user_id: UserId,
        /// The account the request targeted.
        account_number: AccountNumber,
    },

    /// The user already owns the maximum of 10 accounts.
    #[error("user already owns the maximum of 10 accounts")]
    MaxAccountsPerUser,

    /// Initial balance cannot be negative.
    #[error("initial balance cannot be negative: {0}")]
    InvalidInitialBalance(i64),

    /// No account numbers remain in the ten-digit space.
    #[error("account number space is exhausted")]
    NumberSpaceExhausted,

    // ========== Lifecycle Errors ==========
    /// The account is already unregistered.
    #[error("account {0} is already unregistered")]
    AccountUnregistered(AccountNumber),

    /// The account still holds a balance and cannot be unregistered.
    #[error("account {0} still holds a balance")]
    BalanceNotEmpty(AccountNumber),

    // ========== Balance Errors ==========
    /// Transaction amounts must be positive.
    #[error("transaction amount must be positive: {0}")]
    InvalidAmount(i64),

    /// The requested amount exceeds the account balance.
    #[error("amount {amount} exceeds account balance {balance}")]
    AmountExceedsBalance {
        /// The requested amount.
        amount: i64,
        /// The balance at validation time.
        balance: i64,
    },

    /// Crediting the amount would overflow the balance.
    #[error("balance overflow on account credit")]
    BalanceOverflow,

    // ========== Concurrency Errors ==========
    /// The per-account lock could not be acquired in time.
    #[error("timed out waiting for the lock on account {account_number}, please retry")]
    LockContention {
        /// The contended account.
        account_number: AccountNumber,
    },
}

impl AccountError {
    /// Returns the stable error kind for callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::OwnerMismatch { .. } => "OWNER_MISMATCH",
            Self::MaxAccountsPerUser => "MAX_ACCOUNTS_PER_USER",
            Self::InvalidInitialBalance(_) => "INVALID_INITIAL_BALANCE",
            Self::NumberSpaceExhausted => "NUMBER_SPACE_EXHAUSTED",
            Self::AccountUnregistered(_) => "ACCOUNT_ALREADY_UNREGISTERED",
            Self::BalanceNotEmpty(_) => "BALANCE_NOT_EMPTY",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AmountExceedsBalance { .. } => "AMOUNT_EXCEEDS_BALANCE",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::LockContention { .. } => "LOCK_CONTENTION",
        }
    }

    /// Returns true if the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LockContention { .. })
    }
}
