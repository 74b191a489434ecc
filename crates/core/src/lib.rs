//! `tallybank-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error taxonomy, strongly-typed identifiers and money.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult, FieldErrors};
pub use id::{AccountId, TransferId, UserId};
pub use money::{Amount, AmountError, Currency};
