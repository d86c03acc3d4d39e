//! Tally concurrency stress driver.
//!
//! Seeds owners and accounts, fires concurrent use/cancel traffic at them,
//! then audits the ledger: every account's final balance must equal its
//! initial balance minus the net of successfully applied operations, and no
//! balance may ever have gone negative.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, ensure};
use futures::future::join_all;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::transaction::TransactionError;
use tally_shared::{AccountNumber, AppConfig, UserId};
use tally_store::{
    AccountLockManager, AccountRepository, MemoryStore, TransactionRepository, UserRepository,
};

/// Per-worker traffic outcome.
#[derive(Debug, Default)]
struct WorkerReport {
    /// Net amount successfully debited (uses minus cancels).
    net_spent: i64,
    uses: u64,
    cancels: u64,
    rejections: u64,
    contentions: u64,
}

/// Deterministic per-op amount so runs are reproducible.
fn amount_for(op: usize) -> i64 {
    const AMOUNTS: [i64; 5] = [30, 70, 110, 50, 90];
    AMOUNTS[op % AMOUNTS.len()]
}

async fn run_worker(
    transactions: Arc<TransactionRepository>,
    user_id: UserId,
    account_number: AccountNumber,
    ops: usize,
) -> WorkerReport {
    let mut report = WorkerReport::default();

    for op in 0..ops {
        let amount = amount_for(op);
        let record = match transactions.use_balance(user_id, account_number, amount).await {
            Ok(record) => {
                report.uses += 1;
                report.net_spent += amount;
                record
            }
            Err(TransactionError::AmountExceedsBalance { .. }) => {
                // The attempt still gets its audit record.
                let _ = transactions.save_failed_use_transaction(account_number, amount);
                report.rejections += 1;
                continue;
            }
            Err(TransactionError::LockContention { .. }) => {
                report.contentions += 1;
                continue;
            }
            Err(err) => {
                tracing::error!(%err, "unexpected use failure");
                continue;
            }
        };

        // Compensate every third success straight away.
        if op % 3 == 0 {
            match transactions
                .cancel_balance(&record.transaction_id, account_number, amount)
                .await
            {
                Ok(_) => {
                    report.cancels += 1;
                    report.net_spent -= amount;
                }
                Err(TransactionError::LockContention { .. }) => report.contentions += 1,
                Err(err) => tracing::error!(%err, "unexpected cancel failure"),
            }
        }
    }

    report
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tally_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        accounts = config.stress.accounts,
        workers = config.stress.workers,
        ops_per_worker = config.stress.ops_per_worker,
        initial_balance = config.stress.initial_balance,
        lock_acquire_timeout_ms = config.store.lock_acquire_timeout_ms,
        "starting stress run"
    );

    let store = Arc::new(MemoryStore::new());
    let locks = Arc::new(AccountLockManager::new(Duration::from_millis(
        config.store.lock_acquire_timeout_ms,
    )));
    let users = UserRepository::new(Arc::clone(&store));
    let accounts = AccountRepository::new(Arc::clone(&store), Arc::clone(&locks));
    let transactions = Arc::new(TransactionRepository::new(
        Arc::clone(&store),
        Arc::clone(&locks),
    ));

    // One owner per account keeps the per-user account limit out of the way.
    let mut targets = Vec::with_capacity(config.stress.accounts);
    for i in 0..config.stress.accounts {
        let user = users.create_user(&format!("stress-{i}"));
        let account = accounts
            .create_account(user.id, config.stress.initial_balance)
            .await
            .context("seeding account")?;
        targets.push((user.id, account.account_number));
    }

    let mut handles = Vec::new();
    for &(user_id, account_number) in &targets {
        for _ in 0..config.stress.workers {
            let transactions = Arc::clone(&transactions);
            handles.push((
                account_number,
                tokio::spawn(run_worker(
                    transactions,
                    user_id,
                    account_number,
                    config.stress.ops_per_worker,
                )),
            ));
        }
    }

    let mut totals = WorkerReport::default();
    let mut net_by_account: Vec<(AccountNumber, i64)> = targets
        .iter()
        .map(|&(_, account_number)| (account_number, 0i64))
        .collect();

    let joined = join_all(
        handles
            .into_iter()
            .map(|(account_number, handle)| async move { (account_number, handle.await) }),
    )
    .await;

    for (account_number, outcome) in joined {
        let report = outcome.context("worker panicked")?;
        if let Some(entry) = net_by_account
            .iter_mut()
            .find(|(number, _)| *number == account_number)
        {
            entry.1 += report.net_spent;
        }
        totals.net_spent += report.net_spent;
        totals.uses += report.uses;
        totals.cancels += report.cancels;
        totals.rejections += report.rejections;
        totals.contentions += report.contentions;
    }

    // Audit: conservation per account, no negative balances, lock table drained.
    for (account_number, net_spent) in net_by_account {
        let account = store
            .find_account(account_number)
            .context("seeded account vanished")?;
        ensure!(
            account.balance == config.stress.initial_balance - net_spent,
            "balance drift on {account_number}: balance {} with net spend {net_spent}",
            account.balance
        );
        ensure!(account.balance >= 0, "negative balance on {account_number}");
    }
    ensure!(
        locks.contended_accounts() == 0,
        "lock table did not drain after traffic stopped"
    );

    info!(
        uses = totals.uses,
        cancels = totals.cancels,
        rejections = totals.rejections,
        contentions = totals.contentions,
        net_spent = totals.net_spent,
        audit_records = store.transaction_count(),
        "stress run passed"
    );
    Ok(())
}
