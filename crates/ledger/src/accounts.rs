use std::sync::Arc;

use tracing::{info, warn};

use tallybank_core::{Amount, Currency, DomainError, DomainResult, FieldErrors};

use crate::account::{Account, AccountNumberGenerator, NewAccount};
use crate::caller::Caller;
use crate::lookup::{IdentifierKind, Ownership};
use crate::resolver::AccountResolver;
use crate::store::{LedgerStore, LedgerStoreError};
use crate::validation::{AmountRule, FieldInput, amount_field};

/// Validated body of an account-opening request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateAccountRequest {
    pub initial_deposit: Amount,
}

impl CreateAccountRequest {
    pub fn validate(initial_deposit: &FieldInput) -> DomainResult<Self> {
        let mut errors = FieldErrors::new();
        let initial_deposit = amount_field(
            "initial_deposit",
            initial_deposit,
            AmountRule::NonNegative,
            &mut errors,
        );
        match initial_deposit {
            Some(initial_deposit) if errors.is_empty() => Ok(Self { initial_deposit }),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub amount: Amount,
    pub currency: Currency,
}

/// Account opening, listing and lookup.
pub struct AccountService<S> {
    store: S,
    resolver: AccountResolver<S>,
    numbers: Arc<dyn AccountNumberGenerator>,
    currency: Currency,
}

impl<S: LedgerStore + Clone> AccountService<S> {
    /// Number generation attempts before giving up with `Conflict`.
    pub const MAX_NUMBER_ATTEMPTS: usize = 5;

    pub fn new(store: S, numbers: Arc<dyn AccountNumberGenerator>, currency: Currency) -> Self {
        Self {
            resolver: AccountResolver::new(store.clone()),
            store,
            numbers,
            currency,
        }
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub async fn create(&self, caller: Caller, initial_deposit: Amount) -> DomainResult<Account> {
        for attempt in 1..=Self::MAX_NUMBER_ATTEMPTS {
            let candidate = NewAccount {
                owner_id: caller.user_id(),
                external_number: self.numbers.generate(),
                initial_balance: initial_deposit,
            };

            match self.store.insert_account(candidate).await {
                Ok(account) => {
                    info!(
                        account_id = %account.id,
                        owner_id = %account.owner_id,
                        initial_deposit = %initial_deposit,
                        "account created"
                    );
                    return Ok(account);
                }
                Err(LedgerStoreError::DuplicateAccountNumber) => {
                    warn!(attempt, "account number collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::conflict("could not allocate a unique account number"))
    }

    /// The caller's accounts in creation order.
    pub async fn list(&self, caller: Caller) -> DomainResult<Vec<Account>> {
        let mut accounts = self.store.accounts_for_owner(caller.user_id()).await?;
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    pub async fn get(
        &self,
        caller: Caller,
        kind: IdentifierKind,
        identifier: &str,
    ) -> DomainResult<Account> {
        self.resolver
            .resolve(kind, identifier, Ownership::Owner(caller.user_id()))
            .await
    }

    pub async fn balance(
        &self,
        caller: Caller,
        kind: IdentifierKind,
        identifier: &str,
    ) -> DomainResult<Balance> {
        let account = self.get(caller, kind, identifier).await?;
        Ok(Balance {
            amount: account.balance,
            currency: self.currency.clone(),
        })
    }
}
