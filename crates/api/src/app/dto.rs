use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tallybank_core::{Amount, Currency, DomainResult};
use tallybank_ledger::{Account, Balance, FieldInput, Transfer, TransferRequest};

// -------------------------
// Request DTOs
// -------------------------
//
// Fields stay loosely typed so that every problem in a body is reported at
// once, field by field, instead of failing on the first serde error.

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub initial_deposit: Option<Value>,
}

impl CreateAccountRequest {
    pub fn validate(self) -> DomainResult<tallybank_ledger::CreateAccountRequest> {
        tallybank_ledger::CreateAccountRequest::validate(&field_input(self.initial_deposit))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub from_account: Option<Value>,
    pub to_account: Option<Value>,
    pub amount: Option<Value>,
}

impl CreateTransferRequest {
    pub fn validate(self) -> DomainResult<TransferRequest> {
        TransferRequest::validate(
            &field_input(self.from_account),
            &field_input(self.to_account),
            &field_input(self.amount),
        )
    }
}

fn field_input(value: Option<Value>) -> FieldInput {
    match value {
        None | Some(Value::Null) => FieldInput::Missing,
        Some(Value::String(s)) => FieldInput::Text(s),
        Some(Value::Number(n)) => FieldInput::number(n),
        Some(_) => FieldInput::Other,
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub owner_id: String,
    pub account_number: String,
    pub balance: Amount,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl AccountResponse {
    pub fn new(account: &Account, currency: &Currency) -> Self {
        Self {
            id: account.id.get(),
            owner_id: account.owner_id.to_string(),
            account_number: account.external_number.to_string(),
            balance: account.balance,
            currency: currency.clone(),
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountCreatedResponse {
    pub message: &'static str,
    pub account: AccountResponse,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Amount,
    pub currency: Currency,
}

impl From<Balance> for BalanceResponse {
    fn from(value: Balance) -> Self {
        Self {
            balance: value.amount,
            currency: value.currency,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl From<&Transfer> for TransferResponse {
    fn from(t: &Transfer) -> Self {
        Self {
            id: t.id.get(),
            from_account_id: t.from_account_id.get(),
            to_account_id: t.to_account_id.get(),
            amount: t.amount,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransferCreatedResponse {
    pub message: &'static str,
    pub transfer: TransferResponse,
}
