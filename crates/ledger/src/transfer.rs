use chrono::{DateTime, Utc};

use tallybank_core::{AccountId, Amount, TransferId};

/// A committed movement of funds. Exists only if its balance effects committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: TransferId,
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    pub fn touches(&self, account: AccountId) -> bool {
        self.from_account_id == account || self.to_account_id == account
    }
}

/// A transfer ready to be posted to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewTransfer {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}
