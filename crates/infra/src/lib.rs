//! Infrastructure layer: `LedgerStore` adapters and schema migrations.

pub mod store;

pub use store::{InMemoryLedgerStore, PostgresLedgerStore};
