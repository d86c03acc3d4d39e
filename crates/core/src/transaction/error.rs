//! Transaction error types for validation, state, and concurrency failures.

use tally_shared::{AccountNumber, UserId};
use thiserror::Error;

use crate::account::AccountError;

use super::types::TransactionToken;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    // ========== Lookup Errors ==========
    /// Account owner not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Account not found.
    #[error("account not found: {0}")]
    AccountNotFound(AccountNumber),

    /// No transaction with the given token exists.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionToken),

    // ========== Validation Errors ==========
    /// The user does not own the account.
    #[error("user {user_id} does not own account {account_number}")]
    OwnerMismatch {
        /// The requesting user.
        user_id: UserId,
        /// The account the request targeted.
        account_number: AccountNumber,
    },

    /// The account has been unregistered.
    #[error("account {0} is already unregistered")]
    AccountUnregistered(AccountNumber),

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

    // ========== Cancel Errors ==========
    /// The transaction was made against a different account.
    #[error("transaction {transaction_id} does not belong to account {account_number}")]
    TransactionAccountMismatch {
        /// The transaction the caller referenced.
        transaction_id: TransactionToken,
        /// The account the caller referenced.
        account_number: AccountNumber,
    },

    /// Partial cancellation is not permitted.
    #[error("cancel amount {cancel_amount} differs from transaction amount {original_amount} (partial cancel not permitted)")]
    AmountMismatch {
        /// The amount originally transacted.
        original_amount: i64,
        /// The amount the caller tried to cancel.
        cancel_amount: i64,
    },

    /// Transactions older than one year cannot be cancelled.
    #[error("transactions older than one year cannot be cancelled")]
    TooOldToCancel,

    /// Only a successfully applied use can be cancelled.
    #[error("transaction {0} is not a cancellable use")]
    NotCancellable(TransactionToken),

    // ========== Concurrency Errors ==========
    /// The per-account lock could not be acquired in time.
    #[error("timed out waiting for the lock on account {account_number}, please retry")]
    LockContention {
        /// The contended account.
        account_number: AccountNumber,
    },

    // ========== Internal Errors ==========
    /// Unexpected fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TransactionError {
    /// Returns the stable error kind for callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::OwnerMismatch { .. } => "OWNER_MISMATCH",
            Self::AccountUnregistered(_) => "ACCOUNT_ALREADY_UNREGISTERED",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AmountExceedsBalance { .. } => "AMOUNT_EXCEEDS_BALANCE",
            Self::BalanceOverflow => "BALANCE_OVERFLOW",
            Self::TransactionAccountMismatch { .. } => "TRANSACTION_ACCOUNT_MISMATCH",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::TooOldToCancel => "TOO_OLD_TO_CANCEL",
            Self::NotCancellable(_) => "NOT_CANCELLABLE",
            Self::LockContention { .. } => "LOCK_CONTENTION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LockContention { .. })
    }
}

impl From<AccountError> for TransactionError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::UserNotFound(user_id) => Self::UserNotFound(user_id),
            AccountError::AccountNotFound(number) => Self::AccountNotFound(number),
            AccountError::OwnerMismatch {
                user_id,
                account_number,
            } => Self::OwnerMismatch {
                user_id,
                account_number,
            },
            AccountError::AccountUnregistered(number) => Self::AccountUnregistered(number),
            AccountError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            AccountError::AmountExceedsBalance { amount, balance } => {
                Self::AmountExceedsBalance { amount, balance }
            }
            AccountError::BalanceOverflow => Self::BalanceOverflow,
            AccountError::LockContention { account_number } => {
                Self::LockContention { account_number }
            }
            // Registry-only failures cannot arise on the transaction path.
            AccountError::MaxAccountsPerUser
            | AccountError::InvalidInitialBalance(_)
            | AccountError::NumberSpaceExhausted
            | AccountError::BalanceNotEmpty(_) => Self::Internal(err.to_string()),
        }
    }
}
