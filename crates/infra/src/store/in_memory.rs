use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use tallybank_core::{AccountId, TransferId, UserId};
use tallybank_ledger::{
    Account, AccountNumber, LedgerStore, LedgerStoreError, NewAccount, NewTransfer, Transfer,
};

#[derive(Debug, Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, Account>,
    by_number: HashMap<AccountNumber, AccountId>,
    transfers: Vec<Transfer>,
    next_account_id: i64,
    next_transfer_id: i64,
}

impl LedgerState {
    fn account(&self, id: AccountId) -> Result<&Account, LedgerStoreError> {
        self.accounts
            .get(&id)
            .ok_or(LedgerStoreError::AccountMissing(id))
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. A single lock guards all state; a transfer's
/// check-and-apply runs entirely under the write guard, so readers never
/// observe a half-applied transfer.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>, LedgerStoreError> {
        self.state
            .read()
            .map_err(|_| LedgerStoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>, LedgerStoreError> {
        self.state
            .write()
            .map_err(|_| LedgerStoreError::Backend("lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, LedgerStoreError> {
        let mut state = self.write()?;

        if state.by_number.contains_key(&account.external_number) {
            return Err(LedgerStoreError::DuplicateAccountNumber);
        }

        state.next_account_id += 1;
        let id = AccountId::new(state.next_account_id);
        let stored = Account {
            id,
            owner_id: account.owner_id,
            external_number: account.external_number,
            balance: account.initial_balance,
            created_at: Utc::now(),
        };

        state.by_number.insert(stored.external_number.clone(), id);
        state.accounts.insert(id, stored.clone());
        Ok(stored)
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, LedgerStoreError> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerStoreError> {
        let state = self.read()?;
        Ok(state
            .by_number
            .get(number)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, LedgerStoreError> {
        let state = self.read()?;
        Ok(state
            .accounts
            .values()
            .filter(|a| a.owner_id == owner)
            .cloned()
            .collect())
    }

    async fn post_transfer(&self, transfer: NewTransfer) -> Result<Transfer, LedgerStoreError> {
        if transfer.from == transfer.to {
            return Err(LedgerStoreError::InvalidTransfer(
                "source and destination must differ".to_string(),
            ));
        }
        if transfer.amount.is_zero() {
            return Err(LedgerStoreError::InvalidTransfer(
                "amount must be positive".to_string(),
            ));
        }

        let mut state = self.write()?;

        let debited = state
            .account(transfer.from)?
            .balance
            .checked_sub(transfer.amount)
            .ok_or(LedgerStoreError::InsufficientFunds)?;
        let credited = state
            .account(transfer.to)?
            .balance
            .checked_add(transfer.amount)
            .ok_or_else(LedgerStoreError::credit_overflow)?;

        // Both sides validated; apply.
        if let Some(from) = state.accounts.get_mut(&transfer.from) {
            from.balance = debited;
        }
        if let Some(to) = state.accounts.get_mut(&transfer.to) {
            to.balance = credited;
        }

        state.next_transfer_id += 1;
        let committed = Transfer {
            id: TransferId::new(state.next_transfer_id),
            from_account_id: transfer.from,
            to_account_id: transfer.to,
            amount: transfer.amount,
            created_at: Utc::now(),
        };
        state.transfers.push(committed.clone());
        Ok(committed)
    }

    async fn transfers_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<Transfer>, LedgerStoreError> {
        let state = self.read()?;
        Ok(state
            .transfers
            .iter()
            .rev()
            .filter(|t| t.touches(account))
            .cloned()
            .collect())
    }
}
