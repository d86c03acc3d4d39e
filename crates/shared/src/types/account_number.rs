//! Ten-digit account numbers.
//!
//! Account numbers are assigned sequentially starting at `1000000000` and are
//! immutable once assigned. The ten-digit width is a wire invariant: callers
//! display and key on the string form, so the space is fixed and allocation
//! fails when it runs out rather than growing an eleventh digit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN: u64 = 1_000_000_000;
const MAX: u64 = 9_999_999_999;

/// Errors from parsing or allocating account numbers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountNumberError {
    /// The input is not a valid ten-digit account number.
    #[error("account number must be ten decimal digits: {0:?}")]
    Malformed(String),

    /// No numbers remain after `9999999999`.
    #[error("account number space is exhausted")]
    SpaceExhausted,
}

/// A ten-digit account number.
///
/// Ordered so the registry can find the highest assigned number; the numeric
/// value is an implementation detail and callers only ever see the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(u64);

impl AccountNumber {
    /// The number assigned to the first account in an empty registry.
    pub const FIRST: Self = Self(MIN);

    /// Returns the next account number.
    ///
    /// # Errors
    ///
    /// Returns `AccountNumberError::SpaceExhausted` when the ten-digit space
    /// has no successor left.
    pub const fn successor(self) -> Result<Self, AccountNumberError> {
        if self.0 >= MAX {
            Err(AccountNumberError::SpaceExhausted)
        } else {
            Ok(Self(self.0 + 1))
        }
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values in [MIN, MAX] are always ten digits; no padding needed.
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountNumber {
    type Err = AccountNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccountNumberError::Malformed(s.to_string()));
        }
        let value: u64 = s
            .parse()
            .map_err(|_| AccountNumberError::Malformed(s.to_string()))?;
        if !(MIN..=MAX).contains(&value) {
            // Ten digits with a leading zero never come out of the allocator.
            return Err(AccountNumberError::Malformed(s.to_string()));
        }
        Ok(Self(value))
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = AccountNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.to_string()
    }
}
