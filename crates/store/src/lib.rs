//! Storage layer for Tally.
//!
//! The durable engine itself is an external collaborator; this crate holds
//! everything that sits between the domain logic and that engine:
//!
//! - `memory` - in-memory tables standing in for the engine's rows
//! - `lock` - per-account mutual exclusion with bounded acquisition
//! - `repositories` - the operations callers integrate against

pub mod lock;
pub mod memory;
pub mod repositories;

pub use lock::{AccountLockGuard, AccountLockManager, LockError};
pub use memory::MemoryStore;
pub use repositories::{AccountRepository, TransactionRepository, UserRepository};
