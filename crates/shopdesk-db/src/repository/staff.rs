//! # Staff Repository
//!
//! Staff users who issue invoices, and their invoice history.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopdesk_core::{InvoiceKind, LedgerEntry, NewStaffUser, StaffUser};

const STAFF_COLUMNS: &str = "id, name, email, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn create(&self, input: &NewStaffUser) -> DbResult<StaffUser> {
        let input = input.normalized()?;
        let now = Utc::now();

        let user = StaffUser {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            email: input.email,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(email = %user.email, "Creating staff user");

        sqlx::query(
            r#"
            INSERT INTO staff_users (id, name, email, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &user.email),
            other => other,
        })?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StaffUser>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<StaffUser>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff_users WHERE email = ?1");
        let user = sqlx::query_as::<_, StaffUser>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE staff_users SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(active)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff user", id));
        }

        Ok(())
    }

    /// Invoices issued by this user, oldest first.
    pub async fn history(&self, id: &str) -> DbResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, staff_id AS owner_id, invoice_id, invoice_kind, date, total_cents, created_at
            FROM staff_history
            WHERE staff_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<StaffUser>> {
    let sql = format!("SELECT {STAFF_COLUMNS} FROM staff_users WHERE id = ?1");
    let user = sqlx::query_as::<_, StaffUser>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(user)
}

pub(crate) async fn append_history(
    conn: &mut SqliteConnection,
    staff_id: &str,
    invoice_id: &str,
    kind: InvoiceKind,
    date: DateTime<Utc>,
    total_cents: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO staff_history (id, staff_id, invoice_id, invoice_kind, date, total_cents, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(staff_id)
    .bind(invoice_id)
    .bind(kind)
    .bind(date)
    .bind(total_cents)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.staff();

        let user = repo
            .create(&NewStaffUser {
                name: "Anita".to_string(),
                email: "Anita@Shop.in".to_string(),
            })
            .await
            .unwrap();

        let by_email = repo.get_by_email("anita@shop.in").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(by_email.is_active);

        repo.set_active(&user.id, false).await.unwrap();
        assert!(!repo.get_by_id(&user.id).await.unwrap().unwrap().is_active);
        assert!(repo.history(&user.id).await.unwrap().is_empty());
    }
}
