use tallybank_core::DomainResult;

use crate::caller::Caller;
use crate::lookup::{IdentifierKind, Ownership};
use crate::resolver::AccountResolver;
use crate::store::LedgerStore;
use crate::transfer::Transfer;

/// Transfers touching one of the caller's accounts, newest first.
pub struct TransferHistory<S> {
    store: S,
    resolver: AccountResolver<S>,
}

impl<S: LedgerStore + Clone> TransferHistory<S> {
    pub fn new(store: S) -> Self {
        Self {
            resolver: AccountResolver::new(store.clone()),
            store,
        }
    }

    pub async fn list(
        &self,
        caller: Caller,
        kind: IdentifierKind,
        identifier: &str,
    ) -> DomainResult<Vec<Transfer>> {
        let account = self
            .resolver
            .resolve(kind, identifier, Ownership::Owner(caller.user_id()))
            .await?;

        let mut transfers = self.store.transfers_for_account(account.id).await?;
        transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(transfers)
    }
}
