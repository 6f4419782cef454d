//! # Party Repository
//!
//! Customers and suppliers, their running balance and their invoice history.
//!
//! Balance sign: positive means the party owes the shop.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use shopdesk_core::{
    CoreError, Designation, InvoiceKind, LedgerEntry, NewParty, Party, PartyContactPatch,
};

const PARTY_COLUMNS: &str = r#"
    id, name, mobile_number, email, address, designation,
    balance_cents, created_at, updated_at
"#;

/// Placeholder mobile number for the walk-in party. Not a valid customer
/// number, so it can never collide with a real one.
const WALK_IN_MOBILE: &str = "0000000000";

#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    pub async fn create(&self, input: &NewParty) -> DbResult<Party> {
        let input = input.normalized()?;
        let now = Utc::now();

        let party = Party {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            mobile_number: input.mobile_number,
            email: input.email,
            address: input.address,
            designation: input.designation,
            balance_cents: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(mobile = %party.mobile_number, designation = %party.designation, "Creating party");
        insert(&self.pool, &party).await?;

        Ok(party)
    }

    /// Creates the walk-in party used for cash invoices if it does not exist.
    ///
    /// Idempotent; returns the stored party either way.
    pub async fn ensure_walk_in(&self, id: &str) -> DbResult<Party> {
        if let Some(party) = self.get_by_id(id).await? {
            return Ok(party);
        }

        let now = Utc::now();
        let party = Party {
            id: id.to_string(),
            name: "walk-in customer".to_string(),
            mobile_number: WALK_IN_MOBILE.to_string(),
            email: None,
            address: "counter".to_string(),
            designation: Designation::Customer,
            balance_cents: 0,
            created_at: now,
            updated_at: now,
        };

        info!(party_id = %id, "Creating walk-in party");
        insert(&self.pool, &party).await?;

        Ok(party)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Party>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn get_by_mobile(&self, mobile_number: &str) -> DbResult<Option<Party>> {
        let sql = format!("SELECT {PARTY_COLUMNS} FROM parties WHERE mobile_number = ?1");
        let party = sqlx::query_as::<_, Party>(&sql)
            .bind(mobile_number.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(party)
    }

    /// Lists parties, optionally only customers or only suppliers.
    pub async fn list(&self, designation: Option<Designation>) -> DbResult<Vec<Party>> {
        let sql = format!(
            "SELECT {PARTY_COLUMNS} FROM parties WHERE ?1 IS NULL OR designation = ?1 ORDER BY name"
        );
        let parties = sqlx::query_as::<_, Party>(&sql)
            .bind(designation)
            .fetch_all(&self.pool)
            .await?;

        Ok(parties)
    }

    /// Searches parties by name or mobile number, case-insensitively.
    ///
    /// An empty query lists parties by name, up to `limit`.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Party>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching parties");

        let sql = format!(
            r#"
            SELECT {PARTY_COLUMNS} FROM parties
            WHERE lower(name) LIKE ?1 ESCAPE '\' OR mobile_number LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#
        );
        let parties = sqlx::query_as::<_, Party>(&sql)
            .bind(contains_pattern(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(parties)
    }

    /// Applies a typed contact patch. `None` fields are left untouched.
    pub async fn update_contact(&self, id: &str, patch: &PartyContactPatch) -> DbResult<Party> {
        let patch = patch.normalized()?;
        debug!(id = %id, "Updating party contact");

        let result = sqlx::query(
            r#"
            UPDATE parties SET
                name        = COALESCE(?2, name),
                email       = COALESCE(?3, email),
                address     = COALESCE(?4, address),
                designation = COALESCE(?5, designation),
                updated_at  = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.email)
        .bind(&patch.address)
        .bind(patch.designation)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Party", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Party", id))
    }

    /// Invoice history, oldest first.
    pub async fn history(&self, id: &str) -> DbResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, party_id AS owner_id, invoice_id, invoice_kind, date, total_cents, created_at
            FROM party_history
            WHERE party_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

async fn insert(pool: &SqlitePool, party: &Party) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO parties (
            id, name, mobile_number, email, address, designation,
            balance_cents, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&party.id)
    .bind(&party.name)
    .bind(&party.mobile_number)
    .bind(&party.email)
    .bind(&party.address)
    .bind(party.designation)
    .bind(party.balance_cents)
    .bind(party.created_at)
    .bind(party.updated_at)
    .execute(pool)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &party.mobile_number),
        other => other,
    })?;

    Ok(())
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Party>> {
    let sql = format!("SELECT {PARTY_COLUMNS} FROM parties WHERE id = ?1");
    let party = sqlx::query_as::<_, Party>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(party)
}

/// Adds `delta` to the running balance and returns the new balance.
///
/// A delta that would overflow the balance is `AmountOutOfRange`.
pub(crate) async fn adjust_balance(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    debug!(id = %id, delta = %delta, "Adjusting party balance");

    // Balances for which `balance + delta` stays inside i64.
    let lower = if delta < 0 { i64::MIN.saturating_sub(delta) } else { i64::MIN };
    let upper = if delta > 0 { i64::MAX.saturating_sub(delta) } else { i64::MAX };

    let balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE parties SET balance_cents = balance_cents + ?2, updated_at = ?3
        WHERE id = ?1 AND balance_cents BETWEEN ?4 AND ?5
        RETURNING balance_cents
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .bind(lower)
    .bind(upper)
    .fetch_optional(&mut *conn)
    .await?;

    match balance {
        Some(balance) => Ok(balance),
        None if fetch(conn, id).await?.is_some() => {
            Err(CoreError::AmountOutOfRange(format!("balance of party {}", id)).into())
        }
        None => Err(DbError::not_found("Party", id)),
    }
}

pub(crate) async fn append_history(
    conn: &mut SqliteConnection,
    party_id: &str,
    invoice_id: &str,
    kind: InvoiceKind,
    date: DateTime<Utc>,
    total_cents: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO party_history (id, party_id, invoice_id, invoice_kind, date, total_cents, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(party_id)
    .bind(invoice_id)
    .bind(kind)
    .bind(date)
    .bind(total_cents)
    .bind(Utc::now())
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

    fn supplier() -> NewParty {
        NewParty {
            name: "Sharma Traders".to_string(),
            mobile_number: "9812345678".to_string(),
            email: Some("Orders@Sharma.in".to_string()),
            address: "12 Market Yard".to_string(),
            designation: Designation::Supplier,
        }
    }

    async fn repo() -> PartyRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.parties()
    }

    #[tokio::test]
    async fn test_create_normalizes() {
        let repo = repo().await;
        let party = repo.create(&supplier()).await.unwrap();
        assert_eq!(party.name, "sharma traders");
        assert_eq!(party.email.as_deref(), Some("orders@sharma.in"));

        let fetched = repo.get_by_mobile("9812345678").await.unwrap().unwrap();
        assert_eq!(fetched.id, party.id);
    }

    #[tokio::test]
    async fn test_duplicate_mobile_rejected() {
        let repo = repo().await;
        repo.create(&supplier()).await.unwrap();
        let err = repo.create(&supplier()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_ensure_walk_in_is_idempotent() {
        let repo = repo().await;
        let first = repo.ensure_walk_in("walk-in").await.unwrap();
        let second = repo.ensure_walk_in("walk-in").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_by_name_or_mobile() {
        let repo = repo().await;
        repo.ensure_walk_in("walk-in").await.unwrap();
        let sharma = repo.create(&supplier()).await.unwrap();
        repo.create(&NewParty {
            name: "Meera Iyer".to_string(),
            mobile_number: "9876543210".to_string(),
            email: None,
            address: "4 Temple Street".to_string(),
            designation: Designation::Customer,
        })
        .await
        .unwrap();

        let by_name = repo.search("SHARMA", 10).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, sharma.id);

        let by_mobile = repo.search("98123", 10).await.unwrap();
        assert_eq!(by_mobile.len(), 1);
        assert_eq!(by_mobile[0].id, sharma.id);

        assert!(repo.search("nobody", 10).await.unwrap().is_empty());
        assert_eq!(repo.search("", 10).await.unwrap().len(), 3);
        assert_eq!(repo.search("", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_designation() {
        let repo = repo().await;
        repo.ensure_walk_in("walk-in").await.unwrap();
        repo.create(&supplier()).await.unwrap();

        let suppliers = repo.list(Some(Designation::Supplier)).await.unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].designation, Designation::Supplier);
        assert_eq!(repo.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_contact_patch() {
        let repo = repo().await;
        let party = repo.create(&supplier()).await.unwrap();

        let patch = PartyContactPatch {
            address: Some("  14 Market Yard ".to_string()),
            ..Default::default()
        };
        let updated = repo.update_contact(&party.id, &patch).await.unwrap();
        assert_eq!(updated.address, "14 Market Yard");
        assert_eq!(updated.name, "sharma traders");
        assert_eq!(updated.mobile_number, "9812345678");
    }
}
