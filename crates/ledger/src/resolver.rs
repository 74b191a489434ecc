use tallybank_core::{DomainError, DomainResult};

use crate::account::Account;
use crate::lookup::{AccountLookup, IdentifierKind, Ownership};
use crate::store::LedgerStore;

/// Single place where an `(kind, identifier)` pair becomes an [`Account`].
#[derive(Debug, Clone)]
pub struct AccountResolver<S> {
    store: S,
}

impl<S: LedgerStore> AccountResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fetch by a typed lookup without any ownership filtering.
    pub async fn find(&self, lookup: &AccountLookup) -> DomainResult<Option<Account>> {
        let found = match lookup {
            AccountLookup::Id(id) => self.store.account_by_id(*id).await?,
            AccountLookup::Number(number) => self.store.account_by_number(number).await?,
        };
        Ok(found)
    }

    /// Like [`Self::resolve`] but distinguishes "no such account" (`Ok(None)`).
    pub async fn find_raw(
        &self,
        kind: IdentifierKind,
        identifier: &str,
    ) -> DomainResult<Option<Account>> {
        match kind.lookup(identifier) {
            Some(lookup) => self.find(&lookup).await,
            None => Ok(None),
        }
    }

    /// Resolve an identifier; unknown, unparseable and foreign accounts are all
    /// reported as [`DomainError::NotFound`].
    pub async fn resolve(
        &self,
        kind: IdentifierKind,
        identifier: &str,
        ownership: Ownership,
    ) -> DomainResult<Account> {
        self.find_raw(kind, identifier)
            .await?
            .filter(|account| ownership.permits(account))
            .ok_or(DomainError::NotFound)
    }
}
