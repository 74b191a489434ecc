use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use tallybank_core::{AccountId, Amount, UserId};

/// Externally visible account number (e.g. `ACC-7K2P9QX4M1ZD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub const PREFIX: &'static str = "ACC-";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bank account as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub owner_id: UserId,
    pub external_number: AccountNumber,
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Account data prior to insertion; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub owner_id: UserId,
    pub external_number: AccountNumber,
    pub initial_balance: Amount,
}

/// Source of fresh account numbers.
pub trait AccountNumberGenerator: Send + Sync {
    fn generate(&self) -> AccountNumber;
}

/// `ACC-` followed by random upper-case alphanumerics drawn from the thread RNG.
#[derive(Debug, Clone, Copy)]
pub struct RandomAccountNumbers {
    len: usize,
}

impl RandomAccountNumbers {
    const CHARSET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    pub const DEFAULT_LEN: usize = 12;

    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Default for RandomAccountNumbers {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEN)
    }
}

impl AccountNumberGenerator for RandomAccountNumbers {
    fn generate(&self) -> AccountNumber {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..self.len)
            .map(|_| Self::CHARSET[rng.gen_range(0..Self::CHARSET.len())] as char)
            .collect();
        AccountNumber(format!("{}{suffix}", AccountNumber::PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_numbers_have_expected_shape() {
        let number = RandomAccountNumbers::default().generate();
        let suffix = number.as_str().strip_prefix(AccountNumber::PREFIX).unwrap();
        assert_eq!(suffix.len(), RandomAccountNumbers::DEFAULT_LEN);
        assert!(suffix.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn generated_numbers_do_not_repeat_in_practice() {
        let generator = RandomAccountNumbers::default();
        let seen: HashSet<_> = (0..1_000).map(|_| generator.generate()).collect();
        assert_eq!(seen.len(), 1_000);
    }
}
