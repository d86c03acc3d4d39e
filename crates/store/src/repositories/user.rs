//! Owner rows.
//!
//! Owners are created by an external identity system; this repository is the
//! seeding seam that system would write through. The core never mutates them.

use std::sync::Arc;

use chrono::Utc;
use tally_core::account::AccountUser;
use tally_shared::UserId;

use crate::memory::MemoryStore;

/// Repository for account owners.
#[derive(Debug, Clone)]
pub struct UserRepository {
    store: Arc<MemoryStore>,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Registers an owner and returns the stored row.
    #[must_use]
    pub fn create_user(&self, name: &str) -> AccountUser {
        let user = AccountUser {
            id: UserId::new(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_user(user.clone());
        user
    }

    /// Looks up an owner.
    #[must_use]
    pub fn find_user(&self, user_id: UserId) -> Option<AccountUser> {
        self.store.find_user(user_id)
    }
}
