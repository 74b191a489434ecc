//! The transfer execution path.
//!
//! A transfer is validated up front, checked against a snapshot of the source
//! balance, and then posted to the store as a single atomic unit. The store
//! re-checks funds under its own locking, so the snapshot check only serves to
//! fail fast. Conflicts reported by the store are retried a bounded number of
//! times; nothing is applied by a failed attempt.

use tracing::{info, warn};

use tallybank_core::{Amount, DomainError, DomainResult, FieldErrors};

use crate::caller::Caller;
use crate::lookup::{IdentifierKind, Ownership};
use crate::resolver::AccountResolver;
use crate::store::{LedgerStore, LedgerStoreError};
use crate::transfer::{NewTransfer, Transfer};
use crate::validation::{AmountRule, FieldInput, amount_field, identifier_field};

/// Message returned to clients when a transfer could not be committed.
pub const TRANSFER_FAILED_MESSAGE: &str = "Transfer failed. Please try again.";

/// Store attempts per transfer when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

const SAME_ACCOUNT_MESSAGE: &str = "The to account field and from account must be different.";

/// Validated body of a transfer request. Identifiers are interpreted under the
/// request's [`IdentifierKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from_account: String,
    pub to_account: String,
    pub amount: Amount,
}

impl TransferRequest {
    /// Check every field, collecting all problems before failing.
    pub fn validate(
        from_account: &FieldInput,
        to_account: &FieldInput,
        amount: &FieldInput,
    ) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let from_account = identifier_field("from_account", from_account, &mut errors);
        let to_account = identifier_field("to_account", to_account, &mut errors);
        let amount = amount_field("amount", amount, AmountRule::Positive, &mut errors);

        match (from_account, to_account, amount) {
            (Some(from_account), Some(to_account), Some(amount)) if errors.is_empty() => Ok(Self {
                from_account,
                to_account,
                amount,
            }),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

pub struct TransferEngine<S> {
    store: S,
    resolver: AccountResolver<S>,
    max_attempts: usize,
}

impl<S: LedgerStore + Clone> TransferEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(store: S, max_attempts: usize) -> Self {
        Self {
            resolver: AccountResolver::new(store.clone()),
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Move `request.amount` from the caller's `from_account` to `to_account`.
    ///
    /// Errors, in the order they are checked:
    /// - `Validation`: zero amount
    /// - `NotFound`: source account unknown or not owned by the caller
    /// - `Validation`: unknown destination, or both identifiers name the same account
    /// - `InsufficientFunds`: source balance below amount
    /// - `TransferFailed`: the store could not commit
    pub async fn execute(
        &self,
        caller: Caller,
        kind: IdentifierKind,
        request: &TransferRequest,
    ) -> DomainResult<Transfer> {
        if request.amount.is_zero() {
            return Err(DomainError::validation(
                "amount",
                "The amount field must be at least 0.01.",
            ));
        }

        let from = self
            .resolver
            .resolve(kind, &request.from_account, Ownership::Owner(caller.user_id()))
            .await?;

        let Some(to) = self.resolver.find_raw(kind, &request.to_account).await? else {
            return Err(DomainError::validation(
                "to_account",
                "The selected to account is invalid.",
            ));
        };
        if from.id == to.id {
            return Err(DomainError::validation("to_account", SAME_ACCOUNT_MESSAGE));
        }
        if from.balance < request.amount {
            return Err(DomainError::InsufficientFunds);
        }

        let posting = NewTransfer {
            from: from.id,
            to: to.id,
            amount: request.amount,
        };
        let transfer = self.commit(posting).await?;

        info!(
            transfer_id = %transfer.id,
            from_account_id = %transfer.from_account_id,
            to_account_id = %transfer.to_account_id,
            amount = %transfer.amount,
            "transfer committed"
        );
        Ok(transfer)
    }

    async fn commit(&self, posting: NewTransfer) -> DomainResult<Transfer> {
        let mut attempt = 1;
        loop {
            match self.store.post_transfer(posting).await {
                Ok(transfer) => return Ok(transfer),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!(attempt, error = %e, "transfer conflicted, retrying");
                    attempt += 1;
                }
                Err(LedgerStoreError::InsufficientFunds) => {
                    return Err(DomainError::InsufficientFunds);
                }
                Err(LedgerStoreError::InvalidTransfer(msg)) => {
                    return Err(DomainError::validation("to_account", msg));
                }
                Err(e) => {
                    warn!(attempt, error = %e, "transfer failed");
                    return Err(DomainError::transfer_failed(TRANSFER_FAILED_MESSAGE));
                }
            }
        }
    }
}
