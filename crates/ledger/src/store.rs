use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tallybank_core::{AccountId, DomainError, UserId};

use crate::account::{Account, AccountNumber, NewAccount};
use crate::transfer::{NewTransfer, Transfer};

/// Ledger store operation error.
///
/// These are **infrastructure outcomes** as seen from the store; the services
/// translate them into [`DomainError`]s with request-level meaning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerStoreError {
    #[error("account number already exists")]
    DuplicateAccountNumber,

    #[error("account {0} does not exist")]
    AccountMissing(AccountId),

    #[error("insufficient funds")]
    InsufficientFunds,

    /// Serialization failure or deadlock; nothing was applied.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl LedgerStoreError {
    /// The destination balance cannot hold the credited amount.
    pub fn credit_overflow() -> Self {
        Self::InvalidTransfer("credit would overflow balance".to_string())
    }

    /// Whether repeating the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<LedgerStoreError> for DomainError {
    fn from(value: LedgerStoreError) -> Self {
        match value {
            LedgerStoreError::DuplicateAccountNumber => {
                DomainError::conflict("account number already in use")
            }
            LedgerStoreError::AccountMissing(_) => DomainError::NotFound,
            LedgerStoreError::InsufficientFunds => DomainError::InsufficientFunds,
            LedgerStoreError::Conflict(msg) => DomainError::conflict(msg),
            LedgerStoreError::InvalidTransfer(msg) => DomainError::validation("to_account", msg),
            LedgerStoreError::Backend(msg) => DomainError::storage(msg),
        }
    }
}

/// Durable record of accounts and transfers.
///
/// The store is the sole arbiter of concurrent access to balances.
///
/// ## Implementation Requirements
///
/// - `insert_account` assigns a fresh id and rejects a duplicate external number
///   with [`LedgerStoreError::DuplicateAccountNumber`] (never silently overwrites).
/// - `post_transfer` is one atomic unit: both balances and the transfer record are
///   applied together or not at all. Funds are re-checked inside that unit, so a
///   stale read by the caller can never drive a balance negative.
/// - Listings are deterministic: accounts in id order, transfers newest first
///   (ties broken by id, descending).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, LedgerStoreError>;

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, LedgerStoreError>;

    async fn account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerStoreError>;

    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, LedgerStoreError>;

    /// Debit `from`, credit `to` and record the transfer atomically.
    async fn post_transfer(&self, transfer: NewTransfer) -> Result<Transfer, LedgerStoreError>;

    /// Transfers where `account` is sender or receiver, newest first.
    async fn transfers_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<Transfer>, LedgerStoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn insert_account(&self, account: NewAccount) -> Result<Account, LedgerStoreError> {
        (**self).insert_account(account).await
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, LedgerStoreError> {
        (**self).account_by_id(id).await
    }

    async fn account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerStoreError> {
        (**self).account_by_number(number).await
    }

    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, LedgerStoreError> {
        (**self).accounts_for_owner(owner).await
    }

    async fn post_transfer(&self, transfer: NewTransfer) -> Result<Transfer, LedgerStoreError> {
        (**self).post_transfer(transfer).await
    }

    async fn transfers_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<Transfer>, LedgerStoreError> {
        (**self).transfers_for_account(account).await
    }
}
