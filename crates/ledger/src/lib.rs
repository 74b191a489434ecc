//! `tallybank-ledger`: accounts, transfers and the services that move money.
//!
//! Persistence is behind the [`LedgerStore`] port; adapters live in
//! `tallybank-infra`. Every service call takes an explicit [`Caller`].

pub mod account;
pub mod accounts;
pub mod caller;
pub mod history;
pub mod lookup;
pub mod resolver;
pub mod store;
pub mod transfer;
pub mod transfers;
pub mod validation;

pub use account::{Account, AccountNumber, AccountNumberGenerator, NewAccount, RandomAccountNumbers};
pub use accounts::{AccountService, Balance, CreateAccountRequest};
pub use caller::Caller;
pub use history::TransferHistory;
pub use lookup::{AccountLookup, IdentifierKind, Ownership};
pub use resolver::AccountResolver;
pub use store::{LedgerStore, LedgerStoreError};
pub use transfer::{NewTransfer, Transfer};
pub use transfers::{TransferEngine, TransferRequest};
pub use validation::FieldInput;
