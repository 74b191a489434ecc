//! Postgres-backed ledger store.
//!
//! ## Transfer atomicity
//!
//! `post_transfer` runs in one transaction: both account rows are locked with
//! `SELECT … FOR UPDATE` in ascending id order (so two opposite transfers can
//! never deadlock on each other), funds are re-checked against the locked row,
//! both balances are updated and the transfer row is inserted. Dropping the
//! transaction on any early return rolls it back. `CHECK (balance_minor >= 0)`
//! is the last line of defence.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | LedgerStoreError | Scenario |
//! |----------------------|------------------|----------|
//! | `40001` / `40P01` | `Conflict` | serialization failure / deadlock (retryable) |
//! | `23505` on account number | `DuplicateAccountNumber` | number collision |
//! | `23514` on balance check | `InsufficientFunds` | balance would go negative |
//! | `23514` (other) | `InvalidTransfer` | zero amount / same account |
//! | `22003` | `InvalidTransfer` | credit overflows the destination balance |
//! | any other / pool / io | `Backend` | infrastructure failure |

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Postgres, Row, Transaction};
use tracing::{debug, instrument};

use async_trait::async_trait;
use tallybank_core::{AccountId, Amount, TransferId, UserId};
use tallybank_ledger::{
    Account, AccountNumber, LedgerStore, LedgerStoreError, NewAccount, NewTransfer, Transfer,
};

const BALANCE_CHECK: &str = "bank_accounts_balance_non_negative";

const ACCOUNT_COLUMNS: &str = "id, owner_id, account_number, balance_minor, created_at";
const TRANSFER_COLUMNS: &str = "id, from_account_id, to_account_id, amount_minor, created_at";

#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    #[instrument(skip(url))]
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, LedgerStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        debug!("connection pool created");
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), LedgerStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerStoreError::Backend(format!("migration failed: {e}")))?;
        debug!("migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock_balance(
        tx: &mut Transaction<'_, Postgres>,
        id: AccountId,
    ) -> Result<Amount, LedgerStoreError> {
        let row = sqlx::query("SELECT balance_minor FROM bank_accounts WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("lock_account", e))?
            .ok_or(LedgerStoreError::AccountMissing(id))?;

        let minor: i64 = row
            .try_get("balance_minor")
            .map_err(|e| map_sqlx_error("lock_account", e))?;
        Amount::from_minor(minor)
            .map_err(|e| LedgerStoreError::Backend(format!("stored balance for {id}: {e}")))
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(skip(self, account), fields(owner_id = %account.owner_id), err)]
    async fn insert_account(&self, account: NewAccount) -> Result<Account, LedgerStoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO bank_accounts (owner_id, account_number, balance_minor) \
             VALUES ($1, $2, $3) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account.owner_id.as_uuid())
        .bind(account.external_number.as_str())
        .bind(account.initial_balance.minor())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LedgerStoreError::DuplicateAccountNumber
            } else {
                map_sqlx_error("insert_account", e)
            }
        })?;

        account_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, LedgerStoreError> {
        sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM bank_accounts WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("account_by_id", e))?
            .map(|row| account_from_row(&row))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, LedgerStoreError> {
        sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM bank_accounts WHERE account_number = $1"
        ))
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("account_by_number", e))?
        .map(|row| account_from_row(&row))
        .transpose()
    }

    #[instrument(skip(self), err)]
    async fn accounts_for_owner(&self, owner: UserId) -> Result<Vec<Account>, LedgerStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM bank_accounts WHERE owner_id = $1 ORDER BY id ASC"
        ))
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("accounts_for_owner", e))?;

        rows.iter().map(account_from_row).collect()
    }

    #[instrument(
        skip(self),
        fields(from = %transfer.from, to = %transfer.to, amount = %transfer.amount),
        err
    )]
    async fn post_transfer(&self, transfer: NewTransfer) -> Result<Transfer, LedgerStoreError> {
        if transfer.from == transfer.to {
            return Err(LedgerStoreError::InvalidTransfer(
                "source and destination must differ".to_string(),
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let (first, second) = if transfer.from < transfer.to {
            (transfer.from, transfer.to)
        } else {
            (transfer.to, transfer.from)
        };
        let first_balance = Self::lock_balance(&mut tx, first).await?;
        let second_balance = Self::lock_balance(&mut tx, second).await?;
        let from_balance = if first == transfer.from {
            first_balance
        } else {
            second_balance
        };

        if from_balance < transfer.amount {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(LedgerStoreError::InsufficientFunds);
        }

        for (id, delta) in [
            (transfer.from, -transfer.amount.minor()),
            (transfer.to, transfer.amount.minor()),
        ] {
            sqlx::query(
                "UPDATE bank_accounts \
                 SET balance_minor = balance_minor + $2, updated_at = clock_timestamp() \
                 WHERE id = $1",
            )
            .bind(id.get())
            .bind(delta)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_balance", e))?;
        }

        let row = sqlx::query(&format!(
            "INSERT INTO transfers (from_account_id, to_account_id, amount_minor) \
             VALUES ($1, $2, $3) RETURNING {TRANSFER_COLUMNS}"
        ))
        .bind(transfer.from.get())
        .bind(transfer.to.get())
        .bind(transfer.amount.minor())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_transfer", e))?;
        let committed = transfer_from_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(committed)
    }

    #[instrument(skip(self), err)]
    async fn transfers_for_account(
        &self,
        account: AccountId,
    ) -> Result<Vec<Transfer>, LedgerStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM transfers \
             WHERE from_account_id = $1 OR to_account_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(account.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("transfers_for_account", e))?;

        rows.iter().map(transfer_from_row).collect()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") => LedgerStoreError::Conflict(msg),
                Some("23514") if db_err.constraint() == Some(BALANCE_CHECK) => {
                    LedgerStoreError::InsufficientFunds
                }
                Some("23514") => LedgerStoreError::InvalidTransfer(msg),
                Some("22003") => LedgerStoreError::credit_overflow(),
                _ => LedgerStoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            LedgerStoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => LedgerStoreError::Backend(format!("{operation}: {other}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct AccountRow {
    id: i64,
    owner_id: uuid::Uuid,
    account_number: String,
    balance_minor: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AccountRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            account_number: row.try_get("account_number")?,
            balance_minor: row.try_get("balance_minor")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = LedgerStoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId::new(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            external_number: AccountNumber::new(row.account_number),
            balance: Amount::from_minor(row.balance_minor).map_err(|e| {
                LedgerStoreError::Backend(format!("stored balance for {}: {e}", row.id))
            })?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug)]
struct TransferRow {
    id: i64,
    from_account_id: i64,
    to_account_id: i64,
    amount_minor: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TransferRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(TransferRow {
            id: row.try_get("id")?,
            from_account_id: row.try_get("from_account_id")?,
            to_account_id: row.try_get("to_account_id")?,
            amount_minor: row.try_get("amount_minor")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<TransferRow> for Transfer {
    type Error = LedgerStoreError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        Ok(Transfer {
            id: TransferId::new(row.id),
            from_account_id: AccountId::new(row.from_account_id),
            to_account_id: AccountId::new(row.to_account_id),
            amount: Amount::from_minor(row.amount_minor).map_err(|e| {
                LedgerStoreError::Backend(format!("stored amount for transfer {}: {e}", row.id))
            })?,
            created_at: row.created_at,
        })
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, LedgerStoreError> {
    AccountRow::from_row(row)
        .map_err(|e| LedgerStoreError::Backend(format!("failed to decode account row: {e}")))?
        .try_into()
}

fn transfer_from_row(row: &PgRow) -> Result<Transfer, LedgerStoreError> {
    TransferRow::from_row(row)
        .map_err(|e| LedgerStoreError::Backend(format!("failed to decode transfer row: {e}")))?
        .try_into()
}
