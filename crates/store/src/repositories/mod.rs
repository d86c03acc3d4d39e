//! Repositories executing the caller-facing operations.

pub mod account;
pub mod transaction;
pub mod user;

pub use account::AccountRepository;
pub use transaction::TransactionRepository;
pub use user::UserRepository;
