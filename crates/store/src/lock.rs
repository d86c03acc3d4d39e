//! Per-account mutual exclusion.
//!
//! Every balance-affecting sequence (read, validate, mutate, append the audit
//! record) runs under an exclusive lock keyed by account number, so two
//! concurrent operations on the same account can never both observe the
//! pre-mutation balance. Locks on different accounts never contend.
//!
//! Acquisition is bounded: a caller that cannot get the lock within the
//! configured timeout receives a retryable contention error and no state has
//! been touched.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tally_shared::AccountNumber;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{Instant, timeout};

use tally_core::account::AccountError;
use tally_core::transaction::TransactionError;

/// Errors from lock acquisition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lock was not acquired within the configured timeout.
    #[error("timed out waiting for the lock on account {0}")]
    AcquireTimeout(AccountNumber),
}

impl From<LockError> for AccountError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AcquireTimeout(account_number) => Self::LockContention { account_number },
        }
    }
}

impl From<LockError> for TransactionError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AcquireTimeout(account_number) => Self::LockContention { account_number },
        }
    }
}

type LockTable = DashMap<AccountNumber, Arc<Mutex<()>>>;

/// Keyed lock manager providing per-account critical sections.
///
/// The table only holds entries for accounts that currently have a holder or
/// waiters; uncontended entries are reclaimed when their guard drops.
#[derive(Debug, Clone)]
pub struct AccountLockManager {
    locks: Arc<LockTable>,
    acquire_timeout: Duration,
}

impl AccountLockManager {
    /// Creates a manager whose acquisitions time out after `acquire_timeout`.
    #[must_use]
    pub fn new(acquire_timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            acquire_timeout,
        }
    }

    /// Acquires the exclusive lock for `account_number`.
    ///
    /// The returned guard releases the lock when dropped, on every exit path
    /// including panic unwind.
    ///
    /// # Errors
    ///
    /// Returns `LockError::AcquireTimeout` if the lock is still held when the
    /// timeout elapses; nothing has been mutated in that case.
    pub async fn acquire(
        &self,
        account_number: AccountNumber,
    ) -> Result<AccountLockGuard, LockError> {
        let deadline = Instant::now() + self.acquire_timeout;
        loop {
            let lock = self
                .locks
                .entry(account_number)
                .or_default()
                .clone();

            let remaining = deadline.saturating_duration_since(Instant::now());
            let Ok(inner) = timeout(remaining, lock.clone().lock_owned()).await else {
                // A timed-out waiter may be the last reference keeper; reclaim
                // here too so the table always drains once traffic stops.
                reclaim(&self.locks, account_number, &lock);
                return Err(LockError::AcquireTimeout(account_number));
            };

            // The entry can be reclaimed between the lookup above and the
            // lock becoming ours; only a guard on the table's current entry
            // provides exclusion, so a stale one is dropped and retried.
            let is_current = self
                .locks
                .get(&account_number)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &lock));
            if is_current {
                return Ok(AccountLockGuard {
                    account_number,
                    lock,
                    inner: Some(inner),
                    locks: Arc::clone(&self.locks),
                });
            }
            drop(inner);
        }
    }

    /// Number of accounts with a live lock entry (held or awaited).
    #[must_use]
    pub fn contended_accounts(&self) -> usize {
        self.locks.len()
    }
}

/// RAII guard for one account's critical section.
#[derive(Debug)]
pub struct AccountLockGuard {
    account_number: AccountNumber,
    lock: Arc<Mutex<()>>,
    inner: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
}

impl AccountLockGuard {
    /// The account this guard serializes.
    #[must_use]
    pub fn account_number(&self) -> AccountNumber {
        self.account_number
    }
}

impl Drop for AccountLockGuard {
    fn drop(&mut self) {
        self.inner.take();
        reclaim(&self.locks, self.account_number, &self.lock);
    }
}

/// Removes the table entry when `lock` is the current entry and the caller's
/// reference plus the table's are the only two left. Every release path calls
/// this before dropping its own clone, so whichever reference goes away last
/// takes the entry with it; a waiter that clones the entry concurrently keeps
/// the count high and the entry alive.
fn reclaim(locks: &LockTable, account_number: AccountNumber, lock: &Arc<Mutex<()>>) {
    locks.remove_if(&account_number, |_, entry| {
        Arc::ptr_eq(entry, lock) && Arc::strong_count(entry) <= 2
    });
}
