//! How a client names an account: by numeric id or by external number.

use tallybank_core::{AccountId, DomainError, DomainResult, UserId};

use crate::account::{Account, AccountNumber};

/// Declared interpretation of an account identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Id,
    Number,
}

impl IdentifierKind {
    /// Request header carrying the kind.
    pub const HEADER: &'static str = "x-account-identifier-type";

    pub const INVALID_MESSAGE: &'static str = "Invalid or missing X-Account-Identifier-Type header.";

    /// Parse the header value, case-insensitively. Absent or unknown → `BadRequest`.
    pub fn parse(raw: Option<&str>) -> DomainResult<Self> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("id") => Ok(Self::Id),
            Some("number") => Ok(Self::Number),
            _ => Err(DomainError::bad_request(Self::INVALID_MESSAGE)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Number => "number",
        }
    }

    /// Interpret `raw` under this kind.
    ///
    /// `None` means the identifier cannot name any account (e.g. a non-numeric
    /// id), which callers report as not found.
    pub fn lookup(self, raw: &str) -> Option<AccountLookup> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self {
            Self::Id => raw.parse::<AccountId>().ok().map(AccountLookup::Id),
            Self::Number => Some(AccountLookup::Number(AccountNumber::new(raw))),
        }
    }
}

impl core::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved-kind account reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountLookup {
    Id(AccountId),
    Number(AccountNumber),
}

/// Whether resolution must be restricted to the caller's own accounts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ownership {
    Owner(UserId),
    Any,
}

impl Ownership {
    pub fn permits(self, account: &Account) -> bool {
        match self {
            Self::Owner(user) => account.is_owned_by(user),
            Self::Any => true,
        }
    }
}
