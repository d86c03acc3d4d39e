//! Transaction domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::{AccountId, AccountNumber, RecordId};
use uuid::Uuid;

use crate::account::Account;

/// The kind of balance effect a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// A debit reducing the account balance.
    Use,
    /// A compensating credit reversing a prior use.
    Cancel,
}

/// Whether the attempted operation was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionResult {
    /// The balance effect was applied.
    Success,
    /// The attempt was recorded without a balance effect.
    Fail,
}

/// The caller-facing opaque transaction token.
///
/// 32 lowercase hex characters, globally unique. Callers hold this to query
/// or cancel a transaction; the internal row id never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionToken(String);

impl TransactionToken {
    /// Generates a fresh globally-unique token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TransactionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TransactionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for TransactionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One immutable audit record of an attempted use or cancel.
///
/// Records reference their account by identifier only; there is no
/// back-navigation from a record to live account state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Internal row identifier.
    pub id: RecordId,
    /// Caller-facing token.
    pub transaction_id: TransactionToken,
    /// The account the attempt targeted.
    pub account_id: AccountId,
    /// The account number the attempt targeted.
    pub account_number: AccountNumber,
    /// Use or Cancel.
    pub transaction_type: TransactionType,
    /// Success or Fail.
    pub result: TransactionResult,
    /// The attempted amount in minor units. Always positive.
    pub amount: i64,
    /// The balance immediately after the effect, or the unchanged balance on
    /// a failed attempt.
    pub balance_snapshot: i64,
    /// When the attempt was recorded.
    pub transacted_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds the audit record for an attempt against `account`.
    ///
    /// The caller applies (or declines to apply) the balance effect first;
    /// `account.balance` at this point is the snapshot the record keeps.
    #[must_use]
    pub fn record(
        transaction_type: TransactionType,
        result: TransactionResult,
        account: &Account,
        amount: i64,
        transacted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            transaction_id: TransactionToken::generate(),
            account_id: account.id,
            account_number: account.account_number,
            transaction_type,
            result,
            amount,
            balance_snapshot: account.balance,
            transacted_at,
        }
    }

    /// Returns true if this record is a successfully applied use, i.e. the
    /// only kind of record a cancel can compensate.
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        self.transaction_type == TransactionType::Use && self.result == TransactionResult::Success
    }
}
