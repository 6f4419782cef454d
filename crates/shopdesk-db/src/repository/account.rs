//! # Account Repository
//!
//! Ledger accounts (cash drawer, UPI, gateway, bank) and their append-only
//! transaction log.
//!
//! ## Ledger Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balance_cents == Σ credit.amount − Σ debit.amount                      │
//! │                                                                         │
//! │  Every balance change goes through credit()/debit(), which update the  │
//! │  balance and append the matching entry on the same connection. The     │
//! │  opening balance is itself a credit entry.                             │
//! │                                                                         │
//! │  debit() never drives the balance below zero:                          │
//! │     UPDATE accounts SET balance_cents = balance_cents - ?              │
//! │     WHERE id = ? AND balance_cents >= ?                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopdesk_core::validation::{normalize_name, validate_payment_amount};
use shopdesk_core::{
    Account, AccountStatus, AccountTransaction, CoreError, NewAccount, TransactionKind,
};

const ACCOUNT_COLUMNS: &str = r#"
    id, name, account_type, account_number, ifsc_code, branch,
    balance_cents, status, created_at, updated_at
"#;

/// Result of comparing an account's stored balance with its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub stored_balance_cents: i64,
    pub ledger_balance_cents: i64,
}

impl Reconciliation {
    /// Stored minus ledger. Zero when the account is consistent.
    pub fn drift_cents(&self) -> i64 {
        self.stored_balance_cents - self.ledger_balance_cents
    }

    pub fn is_consistent(&self) -> bool {
        self.drift_cents() == 0
    }
}

/// One balance movement to record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Movement<'a> {
    pub amount_cents: i64,
    pub description: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub invoice_id: Option<&'a str>,
}

/// Repository for ledger accounts.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Creates an account, recording any opening balance as a credit entry.
    pub async fn create(&self, input: &NewAccount) -> DbResult<Account> {
        let input = input.normalized()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(name = %input.name, "Creating account");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, name, account_type, account_number, ifsc_code, branch,
                balance_cents, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?8)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(input.account_type)
        .bind(&input.account_number)
        .bind(&input.ifsc_code)
        .bind(&input.branch)
        .bind(input.status)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &input.name),
            other => other,
        })?;

        if input.opening_balance_cents > 0 {
            credit(
                &mut tx,
                &id,
                Movement {
                    amount_cents: input.opening_balance_cents,
                    description: Some("Opening balance"),
                    reference: None,
                    invoice_id: None,
                },
                now,
            )
            .await?;
        }

        let account = fetch(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Account", &id))?;

        tx.commit().await?;
        Ok(account)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE name = ?1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(normalize_name(name))
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    pub async fn list(&self) -> DbResult<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY name");
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    /// Activates or deactivates an account. Inactive accounts reject
    /// invoice payments.
    pub async fn set_status(&self, id: &str, status: AccountStatus) -> DbResult<()> {
        debug!(id = %id, ?status, "Setting account status");

        let result = sqlx::query("UPDATE accounts SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Manual deposit. Returns the new balance.
    pub async fn deposit(
        &self,
        id: &str,
        amount_cents: i64,
        description: Option<&str>,
        reference: Option<&str>,
    ) -> DbResult<i64> {
        validate_payment_amount(amount_cents)?;

        let mut tx = self.pool.begin().await?;
        let balance = credit(
            &mut tx,
            id,
            Movement {
                amount_cents,
                description,
                reference,
                invoice_id: None,
            },
            Utc::now(),
        )
        .await?;
        tx.commit().await?;

        Ok(balance)
    }

    /// Manual withdrawal. Fails with `InsufficientBalance` rather than go
    /// below zero. Returns the new balance.
    pub async fn withdraw(
        &self,
        id: &str,
        amount_cents: i64,
        description: Option<&str>,
        reference: Option<&str>,
    ) -> DbResult<i64> {
        validate_payment_amount(amount_cents)?;

        let mut tx = self.pool.begin().await?;
        let balance = debit(
            &mut tx,
            id,
            Movement {
                amount_cents,
                description,
                reference,
                invoice_id: None,
            },
            Utc::now(),
        )
        .await?;
        tx.commit().await?;

        Ok(balance)
    }

    /// Transaction log, oldest first.
    pub async fn transactions(&self, id: &str) -> DbResult<Vec<AccountTransaction>> {
        let entries = sqlx::query_as::<_, AccountTransaction>(
            r#"
            SELECT id, account_id, kind, amount_cents, description, reference, invoice_id, created_at
            FROM account_transactions
            WHERE account_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Recomputes the balance from the ledger and compares it with the
    /// stored value.
    pub async fn reconcile(&self, id: &str) -> DbResult<Reconciliation> {
        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT
                a.balance_cents,
                COALESCE(SUM(CASE t.kind WHEN 'credit' THEN t.amount_cents ELSE -t.amount_cents END), 0)
            FROM accounts a
            LEFT JOIN account_transactions t ON t.account_id = a.id
            WHERE a.id = ?1
            GROUP BY a.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let (stored, ledger) = row.ok_or_else(|| DbError::not_found("Account", id))?;
        let reconciliation = Reconciliation {
            stored_balance_cents: stored,
            ledger_balance_cents: ledger,
        };

        if !reconciliation.is_consistent() {
            warn!(
                account_id = %id,
                drift_cents = reconciliation.drift_cents(),
                "Account balance drifted from its ledger"
            );
        }

        Ok(reconciliation)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
    let account = sqlx::query_as::<_, Account>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(account)
}

/// Adds to the balance and appends a credit entry. Returns the new balance.
///
/// Refuses a credit that would overflow the balance.
pub(crate) async fn credit(
    conn: &mut SqliteConnection,
    id: &str,
    movement: Movement<'_>,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    debug!(id = %id, amount = movement.amount_cents, "Crediting account");

    let balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE accounts
        SET balance_cents = balance_cents + ?2, updated_at = ?3
        WHERE id = ?1 AND balance_cents <= ?4
        RETURNING balance_cents
        "#,
    )
    .bind(id)
    .bind(movement.amount_cents)
    .bind(now)
    .bind(i64::MAX.saturating_sub(movement.amount_cents))
    .fetch_optional(&mut *conn)
    .await?;

    let balance = match balance {
        Some(balance) => balance,
        None => {
            fetch(conn, id)
                .await?
                .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
            return Err(CoreError::AmountOutOfRange(format!("balance of account {}", id)).into());
        }
    };
    append_entry(conn, id, TransactionKind::Credit, movement, now).await?;

    Ok(balance)
}

/// Subtracts from the balance and appends a debit entry, refusing to go
/// below zero. Returns the new balance.
pub(crate) async fn debit(
    conn: &mut SqliteConnection,
    id: &str,
    movement: Movement<'_>,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    debug!(id = %id, amount = movement.amount_cents, "Debiting account");

    let balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE accounts
        SET balance_cents = balance_cents - ?2, updated_at = ?3
        WHERE id = ?1 AND balance_cents >= ?2
        RETURNING balance_cents
        "#,
    )
    .bind(id)
    .bind(movement.amount_cents)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    let balance = match balance {
        Some(balance) => balance,
        None => {
            let account = fetch(conn, id)
                .await?
                .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
            return Err(CoreError::InsufficientBalance {
                account: account.name,
                balance_cents: account.balance_cents,
                requested_cents: movement.amount_cents,
            }
            .into());
        }
    };

    append_entry(conn, id, TransactionKind::Debit, movement, now).await?;

    Ok(balance)
}

async fn append_entry(
    conn: &mut SqliteConnection,
    account_id: &str,
    kind: TransactionKind,
    movement: Movement<'_>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO account_transactions (
            id, account_id, kind, amount_cents, description, reference, invoice_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(account_id)
    .bind(kind)
    .bind(movement.amount_cents)
    .bind(movement.description)
    .bind(movement.reference)
    .bind(movement.invoice_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use shopdesk_core::{AccountType, ErrorKind};

    fn bank(opening: i64) -> NewAccount {
        NewAccount {
            name: "HDFC Current".to_string(),
            account_type: AccountType::Bank,
            account_number: Some("50200012345678".to_string()),
            ifsc_code: Some("HDFC0001234".to_string()),
            branch: Some("MG Road".to_string()),
            opening_balance_cents: opening,
            status: AccountStatus::Active,
        }
    }

    async fn repo() -> AccountRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts()
    }

    #[tokio::test]
    async fn test_opening_balance_is_a_credit_entry() {
        let repo = repo().await;
        let account = repo.create(&bank(50_000)).await.unwrap();

        assert_eq!(account.name, "hdfc current");
        assert_eq!(account.balance_cents, 50_000);

        let entries = repo.transactions(&account.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TransactionKind::Credit);
        assert!(repo.reconcile(&account.id).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw() {
        let repo = repo().await;
        let account = repo.create(&bank(0)).await.unwrap();

        assert_eq!(
            repo.deposit(&account.id, 1_000, Some("float"), None).await.unwrap(),
            1_000
        );
        assert_eq!(
            repo.withdraw(&account.id, 400, None, Some("CHQ-1")).await.unwrap(),
            600
        );

        let reconciliation = repo.reconcile(&account.id).await.unwrap();
        assert_eq!(reconciliation.ledger_balance_cents, 600);
        assert!(reconciliation.is_consistent());
    }

    #[tokio::test]
    async fn test_withdraw_never_goes_negative() {
        let repo = repo().await;
        let account = repo.create(&bank(300)).await.unwrap();

        let err = repo.withdraw(&account.id, 500, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientBalance {
                balance_cents: 300,
                requested_cents: 500,
                ..
            })
        ));

        let account = repo.get_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(account.balance_cents, 300);
        assert_eq!(repo.transactions(&account.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_account() {
        let repo = repo().await;
        let err = repo.deposit("missing", 100, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reconcile_detects_drift() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accounts();
        let account = repo.create(&bank(1_000)).await.unwrap();

        sqlx::query("UPDATE accounts SET balance_cents = 1500 WHERE id = ?1")
            .bind(&account.id)
            .execute(db.pool())
            .await
            .unwrap();

        let reconciliation = repo.reconcile(&account.id).await.unwrap();
        assert_eq!(reconciliation.drift_cents(), 500);
        assert!(!reconciliation.is_consistent());
    }

    #[tokio::test]
    async fn test_set_status() {
        let repo = repo().await;
        let account = repo.create(&bank(0)).await.unwrap();

        repo.set_status(&account.id, AccountStatus::Inactive).await.unwrap();
        let account = repo.get_by_id(&account.id).await.unwrap().unwrap();
        assert!(!account.is_active());
    }
}
