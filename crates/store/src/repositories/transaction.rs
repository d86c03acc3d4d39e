//! Transaction repository: balance use, compensating cancel, and the audit
//! trail.
//!
//! A failed validation here returns the error and writes nothing; the outer
//! actor that owns the attempt then records it through
//! [`TransactionRepository::save_failed_use_transaction`] or
//! [`TransactionRepository::save_failed_cancel_transaction`], so every attempt
//! still ends up with exactly one audit record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use tally_core::transaction::{
    Transaction, TransactionError, TransactionResult, TransactionService, TransactionToken,
    TransactionType,
};
use tally_shared::{AccountNumber, UserId};

use crate::lock::AccountLockManager;
use crate::memory::MemoryStore;

/// Repository for balance-affecting operations and audit queries.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    store: Arc<MemoryStore>,
    locks: Arc<AccountLockManager>,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, locks: Arc<AccountLockManager>) -> Self {
        Self { store, locks }
    }

    /// Debits `amount` from the account and appends the Success/Use record.
    ///
    /// The whole read-validate-mutate-append sequence runs under the
    /// account's exclusion guard; the balance row and the audit record are
    /// committed as one unit.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `AccountNotFound`, `OwnerMismatch`,
    /// `AccountUnregistered`, `InvalidAmount`, `AmountExceedsBalance`, or
    /// `LockContention`. Nothing is mutated on any error.
    pub async fn use_balance(
        &self,
        user_id: UserId,
        account_number: AccountNumber,
        amount: i64,
    ) -> Result<Transaction, TransactionError> {
        self.store
            .find_user(user_id)
            .ok_or(TransactionError::UserNotFound(user_id))?;
        self.store
            .find_account(account_number)
            .ok_or(TransactionError::AccountNotFound(account_number))?;

        let guard = self.locks.acquire(account_number).await?;

        let mut account = self
            .store
            .find_account(account_number)
            .ok_or(TransactionError::AccountNotFound(account_number))?;
        TransactionService::validate_use(user_id, &account, amount)?;
        account.use_balance(amount)?;

        let record = Transaction::record(
            TransactionType::Use,
            TransactionResult::Success,
            &account,
            amount,
            Utc::now(),
        );
        self.store.commit(&guard, account, record.clone());
        drop(guard);

        info!(
            account_number = %record.account_number,
            transaction_id = %record.transaction_id,
            amount,
            balance_snapshot = record.balance_snapshot,
            "balance used"
        );
        Ok(record)
    }

    /// Appends a Fail/Use record without touching the balance.
    ///
    /// Used when an out-of-band actor decides an attempt must be recorded as
    /// failed. `balance_snapshot` is the current, unchanged balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown.
    pub fn save_failed_use_transaction(
        &self,
        account_number: AccountNumber,
        amount: i64,
    ) -> Result<Transaction, TransactionError> {
        self.save_failed_transaction(TransactionType::Use, account_number, amount)
    }

    /// Credits `amount` back to the account, compensating the transaction
    /// identified by `transaction_id`, and appends the Success/Cancel record.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, `AccountNotFound`,
    /// `TransactionAccountMismatch`, `AmountMismatch`, `TooOldToCancel`,
    /// `NotCancellable`, `BalanceOverflow`, or `LockContention`. Nothing is
    /// mutated on any error.
    pub async fn cancel_balance(
        &self,
        transaction_id: &TransactionToken,
        account_number: AccountNumber,
        amount: i64,
    ) -> Result<Transaction, TransactionError> {
        let original = self
            .store
            .find_transaction(transaction_id)
            .ok_or_else(|| TransactionError::TransactionNotFound(transaction_id.clone()))?;
        self.store
            .find_account(account_number)
            .ok_or(TransactionError::AccountNotFound(account_number))?;

        let guard = self.locks.acquire(account_number).await?;

        let mut account = self
            .store
            .find_account(account_number)
            .ok_or(TransactionError::AccountNotFound(account_number))?;
        TransactionService::validate_cancel(&original, &account, amount, Utc::now())?;
        account.cancel_balance(amount)?;

        let record = Transaction::record(
            TransactionType::Cancel,
            TransactionResult::Success,
            &account,
            amount,
            Utc::now(),
        );
        self.store.commit(&guard, account, record.clone());
        drop(guard);

        info!(
            account_number = %record.account_number,
            transaction_id = %record.transaction_id,
            cancelled = %original.transaction_id,
            amount,
            balance_snapshot = record.balance_snapshot,
            "balance use cancelled"
        );
        Ok(record)
    }

    /// Appends a Fail/Cancel record without touching the balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown.
    pub fn save_failed_cancel_transaction(
        &self,
        account_number: AccountNumber,
        amount: i64,
    ) -> Result<Transaction, TransactionError> {
        self.save_failed_transaction(TransactionType::Cancel, account_number, amount)
    }

    /// Returns the audit record for `transaction_id`, unchanged.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` if no such record exists.
    pub fn query_transaction(
        &self,
        transaction_id: &TransactionToken,
    ) -> Result<Transaction, TransactionError> {
        self.store
            .find_transaction(transaction_id)
            .ok_or_else(|| TransactionError::TransactionNotFound(transaction_id.clone()))
    }

    fn save_failed_transaction(
        &self,
        transaction_type: TransactionType,
        account_number: AccountNumber,
        amount: i64,
    ) -> Result<Transaction, TransactionError> {
        let account = self
            .store
            .find_account(account_number)
            .ok_or(TransactionError::AccountNotFound(account_number))?;

        let record = Transaction::record(
            transaction_type,
            TransactionResult::Fail,
            &account,
            amount,
            Utc::now(),
        );
        self.store.append_transaction(record.clone());

        debug!(
            account_number = %record.account_number,
            transaction_id = %record.transaction_id,
            transaction_type = ?record.transaction_type,
            amount,
            "failed attempt recorded"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Duration as ChronoDuration;

    use crate::repositories::account::AccountRepository;
    use crate::repositories::user::UserRepository;

    struct Fixture {
        store: Arc<MemoryStore>,
        users: UserRepository,
        accounts: AccountRepository,
        transactions: TransactionRepository,
    }

    fn setup() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(AccountLockManager::new(Duration::from_millis(500)));
        Fixture {
            users: UserRepository::new(Arc::clone(&store)),
            accounts: AccountRepository::new(Arc::clone(&store), Arc::clone(&locks)),
            transactions: TransactionRepository::new(Arc::clone(&store), locks),
            store,
        }
    }

    async fn seeded_account(fixture: &Fixture, balance: i64) -> (UserId, AccountNumber) {
        let user = fixture.users.create_user("hana");
        let account = fixture.accounts.create_account(user.id, balance).await.unwrap();
        (user.id, account.account_number)
    }

    #[tokio::test]
    async fn test_use_balance_success() {
        let fixture = setup();
        let (user_id, account_number) = seeded_account(&fixture, 10_000).await;

        let record = fixture
            .transactions
            .use_balance(user_id, account_number, 200)
            .await
            .unwrap();

        assert_eq!(record.transaction_type, TransactionType::Use);
        assert_eq!(record.result, TransactionResult::Success);
        assert_eq!(record.amount, 200);
        assert_eq!(record.balance_snapshot, 9_800);
        assert_eq!(
            fixture.store.find_account(account_number).unwrap().balance,
            9_800
        );
    }

    #[tokio::test]
    async fn test_use_balance_unknown_user_and_account() {
        let fixture = setup();
        let (_, account_number) = seeded_account(&fixture, 10_000).await;

        let stranger = UserId::new();
        assert_eq!(
            fixture
                .transactions
                .use_balance(stranger, account_number, 200)
                .await
                .unwrap_err(),
            TransactionError::UserNotFound(stranger)
        );

        let user = fixture.users.create_user("minsu");
        let missing: AccountNumber = "1234567890".parse().unwrap();
        assert_eq!(
            fixture
                .transactions
                .use_balance(user.id, missing, 200)
                .await
                .unwrap_err(),
            TransactionError::AccountNotFound(missing)
        );
    }

    #[tokio::test]
    async fn test_use_balance_failed_validation_writes_no_record() {
        let fixture = setup();
        let (user_id, account_number) = seeded_account(&fixture, 100).await;

        let err = fixture
            .transactions
            .use_balance(user_id, account_number, 200)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TransactionError::AmountExceedsBalance {
                amount: 200,
                balance: 100
            }
        );
        assert_eq!(fixture.store.transaction_count(), 0);
        assert_eq!(
            fixture.store.find_account(account_number).unwrap().balance,
            100
        );
    }

    #[tokio::test]
    async fn test_use_balance_on_unregistered_account() {
        let fixture = setup();
        let (user_id, account_number) = seeded_account(&fixture, 0).await;
        fixture
            .accounts
            .delete_account(user_id, account_number)
            .await
            .unwrap();

        assert_eq!(
            fixture
                .transactions
                .use_balance(user_id, account_number, 10)
                .await
                .unwrap_err(),
            TransactionError::AccountUnregistered(account_number)
        );
    }

    #[tokio::test]
    async fn test_save_failed_use_snapshots_unchanged_balance() {
        let fixture = setup();
        let (_, account_number) = seeded_account(&fixture, 100).await;

        let record = fixture
            .transactions
            .save_failed_use_transaction(account_number, 500)
            .unwrap();

        assert_eq!(record.result, TransactionResult::Fail);
        assert_eq!(record.transaction_type, TransactionType::Use);
        assert_eq!(record.balance_snapshot, 100);
        assert_eq!(
            fixture.store.find_account(account_number).unwrap().balance,
            100
        );
        assert_eq!(fixture.store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_restores_pre_use_balance() {
        let fixture = setup();
        let (user_id, account_number) = seeded_account(&fixture, 10_000).await;

        let used = fixture
            .transactions
            .use_balance(user_id, account_number, 1_000)
            .await
            .unwrap();
        let cancelled = fixture
            .transactions
            .cancel_balance(&used.transaction_id, account_number, 1_000)
            .await
            .unwrap();

        assert_eq!(cancelled.transaction_type, TransactionType::Cancel);
        assert_eq!(cancelled.result, TransactionResult::Success);
        assert_eq!(cancelled.balance_snapshot, 10_000);
        assert_ne!(cancelled.transaction_id, used.transaction_id);
        assert_eq!(
            fixture.store.find_account(account_number).unwrap().balance,
            10_000
        );
    }

    #[tokio::test]
    async fn test_cancel_with_different_amount_fails() {
        let fixture = setup();
        let (user_id, account_number) = seeded_account(&fixture, 10_000).await;

        let used = fixture
            .transactions
            .use_balance(user_id, account_number, 1_000)
            .await
            .unwrap();
        let err = fixture
            .transactions
            .cancel_balance(&used.transaction_id, account_number, 500)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TransactionError::AmountMismatch {
                original_amount: 1_000,
                cancel_amount: 500
            }
        );
        assert_eq!(
            fixture.store.find_account(account_number).unwrap().balance,
            9_000
        );
    }

    #[tokio::test]
    async fn test_cancel_against_wrong_account_fails() {
        let fixture = setup();
        let (user_id, first_number) = seeded_account(&fixture, 10_000).await;
        let second = fixture
            .accounts
            .create_account(user_id, 10_000)
            .await
            .unwrap();

        let used = fixture
            .transactions
            .use_balance(user_id, first_number, 1_000)
            .await
            .unwrap();

        assert!(matches!(
            fixture
                .transactions
                .cancel_balance(&used.transaction_id, second.account_number, 1_000)
                .await
                .unwrap_err(),
            TransactionError::TransactionAccountMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn test_cancel_year_old_transaction_fails() {
        let fixture = setup();
        let (_user_id, account_number) = seeded_account(&fixture, 10_000).await;

        // Age an applied use past the window, bypassing the repository clock.
        let mut aged_account = fixture.store.find_account(account_number).unwrap();
        aged_account.use_balance(1_000).unwrap();
        let aged = Transaction::record(
            TransactionType::Use,
            TransactionResult::Success,
            &aged_account,
            1_000,
            Utc::now() - ChronoDuration::days(400),
        );
        fixture.store.append_transaction(aged.clone());
        fixture.store.save_account(aged_account);

        assert_eq!(
            fixture
                .transactions
                .cancel_balance(&aged.transaction_id, account_number, 1_000)
                .await
                .unwrap_err(),
            TransactionError::TooOldToCancel
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_transaction_fails() {
        let fixture = setup();
        let (_, account_number) = seeded_account(&fixture, 10_000).await;

        let missing = TransactionToken::generate();
        assert_eq!(
            fixture
                .transactions
                .cancel_balance(&missing, account_number, 1_000)
                .await
                .unwrap_err(),
            TransactionError::TransactionNotFound(missing)
        );
    }

    #[tokio::test]
    async fn test_save_failed_cancel_records_fail() {
        let fixture = setup();
        let (_, account_number) = seeded_account(&fixture, 100).await;

        let record = fixture
            .transactions
            .save_failed_cancel_transaction(account_number, 1_000)
            .unwrap();

        assert_eq!(record.transaction_type, TransactionType::Cancel);
        assert_eq!(record.result, TransactionResult::Fail);
        assert_eq!(record.balance_snapshot, 100);
    }

    #[tokio::test]
    async fn test_query_transaction_round_trip() {
        let fixture = setup();
        let (user_id, account_number) = seeded_account(&fixture, 10_000).await;

        let used = fixture
            .transactions
            .use_balance(user_id, account_number, 250)
            .await
            .unwrap();
        let queried = fixture
            .transactions
            .query_transaction(&used.transaction_id)
            .unwrap();
        assert_eq!(queried, used);

        let missing = TransactionToken::generate();
        assert_eq!(
            fixture
                .transactions
                .query_transaction(&missing)
                .unwrap_err(),
            TransactionError::TransactionNotFound(missing)
        );
    }
}
