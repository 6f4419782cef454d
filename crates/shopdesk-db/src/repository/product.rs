//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD and typed pricing patches
//! - Relative stock updates
//! - Append-only invoice references
//!
//! Functions taking `&mut SqliteConnection` run inside a caller-owned
//! transaction (the settlement engine); `ProductRepository` methods run on
//! the pool.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::contains_pattern;
use crate::error::{DbError, DbResult};
use shopdesk_core::{InvoiceKind, NewProduct, Product, ProductInvoiceRef, ProductPricingPatch};

const PRODUCT_COLUMNS: &str = r#"
    id, name, item_code, unit,
    purchase_price_cents, sale_price_cents, min_sale_price_cents, mrp_cents,
    sale_discount_bps, low_stock_threshold,
    stock_quantity, track_inventory, is_active,
    created_at, updated_at
"#;

/// Result limit for catalog search at the counter.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.create(&new_product).await?;
/// repo.update_stock(&product.id, 24).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name or item code already exists
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        let input = input.normalized()?;
        let now = Utc::now();

        let product = Product {
            id: generate_product_id(),
            name: input.name,
            item_code: input.item_code,
            unit: input.unit,
            purchase_price_cents: input.purchase_price_cents,
            sale_price_cents: input.sale_price_cents,
            min_sale_price_cents: input.min_sale_price_cents,
            mrp_cents: input.mrp_cents,
            sale_discount_bps: input.sale_discount_bps,
            low_stock_threshold: input.low_stock_threshold,
            stock_quantity: input.opening_stock,
            track_inventory: input.track_inventory,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, item_code, unit,
                purchase_price_cents, sale_price_cents, min_sale_price_cents, mrp_cents,
                sale_discount_bps, low_stock_threshold,
                stock_quantity, track_inventory, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.item_code)
        .bind(product.unit)
        .bind(product.purchase_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.min_sale_price_cents)
        .bind(product.mrp_cents)
        .bind(product.sale_discount_bps)
        .bind(product.low_stock_threshold)
        .bind(product.stock_quantity)
        .bind(product.track_inventory)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.name),
            other => other,
        })?;

        Ok(product)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets a product by its (case-insensitive) name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(name.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Searches active products by name or item code, case-insensitively.
    ///
    /// An empty query falls back to [`Self::list_active`].
    ///
    /// ## Example
    /// ```rust,ignore
    /// let products = repo.search("tumbler", DEFAULT_SEARCH_LIMIT).await?;
    /// ```
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1
              AND (lower(name) LIKE ?1 ESCAPE '\' OR lower(item_code) LIKE ?1 ESCAPE '\')
            ORDER BY name
            LIMIT ?2
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(contains_pattern(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active tracked products at or below their low-stock threshold.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE is_active = 1
              AND track_inventory = 1
              AND stock_quantity <= COALESCE(low_stock_threshold, 0)
            ORDER BY stock_quantity, name
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Applies a typed pricing patch. `None` fields are left untouched.
    pub async fn update_pricing(&self, id: &str, patch: &ProductPricingPatch) -> DbResult<Product> {
        patch.validate()?;
        debug!(id = %id, "Updating product pricing");

        if !patch.is_empty() {
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    purchase_price_cents = COALESCE(?2, purchase_price_cents),
                    sale_price_cents     = COALESCE(?3, sale_price_cents),
                    min_sale_price_cents = COALESCE(?4, min_sale_price_cents),
                    mrp_cents            = COALESCE(?5, mrp_cents),
                    sale_discount_bps    = COALESCE(?6, sale_discount_bps),
                    low_stock_threshold  = COALESCE(?7, low_stock_threshold),
                    updated_at = ?8
                WHERE id = ?1
                "#,
            )
            .bind(id)
            .bind(patch.purchase_price_cents)
            .bind(patch.sale_price_cents)
            .bind(patch.min_sale_price_cents)
            .bind(patch.mrp_cents)
            .bind(patch.sale_discount_bps)
            .bind(patch.low_stock_threshold)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", id));
            }
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Adjusts stock outside of an invoice (stock count, damage write-off).
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        apply_stock_delta(&mut conn, id, delta, Utc::now()).await
    }

    /// Soft-deletes a product. Historical invoices keep their snapshot.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Invoices that moved this product's stock, oldest first.
    pub async fn invoice_refs(&self, id: &str) -> DbResult<Vec<ProductInvoiceRef>> {
        let refs = sqlx::query_as::<_, ProductInvoiceRef>(
            r#"
            SELECT product_id, invoice_id, invoice_kind, quantity_delta, created_at
            FROM product_invoice_refs
            WHERE product_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(refs)
    }

    /// Counts active products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Applies a relative stock change and returns the new level.
///
/// ## Delta Pattern
/// ```text
/// ❌ UPDATE products SET stock_quantity = 7          (lost update)
/// ✅ UPDATE products SET stock_quantity = stock_quantity - 3
/// ```
/// Two settlements selling 3 and 2 always net -5.
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    debug!(id = %id, delta = %delta, "Updating stock");

    let level: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity + ?2,
            updated_at = ?3
        WHERE id = ?1
        RETURNING stock_quantity
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    level.ok_or_else(|| DbError::not_found("Product", id))
}

pub(crate) async fn record_invoice_ref(
    conn: &mut SqliteConnection,
    product_id: &str,
    invoice_id: &str,
    kind: InvoiceKind,
    quantity_delta: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO product_invoice_refs (product_id, invoice_id, invoice_kind, quantity_delta, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(product_id)
    .bind(invoice_id)
    .bind(kind)
    .bind(quantity_delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use shopdesk_core::ProductUnit;

    fn cable() -> NewProduct {
        NewProduct {
            name: "USB Cable".to_string(),
            item_code: Some("UC-01".to_string()),
            unit: ProductUnit::Pcs,
            purchase_price_cents: 6_000,
            sale_price_cents: 10_000,
            min_sale_price_cents: None,
            mrp_cents: Some(12_000),
            sale_discount_bps: None,
            low_stock_threshold: Some(3),
            opening_stock: 10,
            track_inventory: true,
        }
    }

    async fn repo() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let repo = repo().await;
        let created = repo.create(&cable()).await.unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "usb cable");
        assert_eq!(fetched.item_code.as_deref(), Some("uc-01"));
        assert_eq!(fetched.stock_quantity, 10);

        let by_name = repo.get_by_name("  USB CABLE ").await.unwrap();
        assert_eq!(by_name.map(|p| p.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let repo = repo().await;
        repo.create(&cable()).await.unwrap();

        let mut again = cable();
        again.item_code = None;
        let err = repo.create(&again).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_stock_is_relative() {
        let repo = repo().await;
        let product = repo.create(&cable()).await.unwrap();

        assert_eq!(repo.update_stock(&product.id, -3).await.unwrap(), 7);
        assert_eq!(repo.update_stock(&product.id, -2).await.unwrap(), 5);
        assert!(matches!(
            repo.update_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_pricing_patch_leaves_other_fields() {
        let repo = repo().await;
        let product = repo.create(&cable()).await.unwrap();

        let patch = ProductPricingPatch {
            sale_price_cents: Some(11_000),
            ..Default::default()
        };
        let updated = repo.update_pricing(&product.id, &patch).await.unwrap();
        assert_eq!(updated.sale_price_cents, 11_000);
        assert_eq!(updated.purchase_price_cents, 6_000);
        assert_eq!(updated.mrp_cents, Some(12_000));
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let repo = repo().await;
        let product = repo.create(&cable()).await.unwrap();
        assert!(repo.list_low_stock().await.unwrap().is_empty());

        repo.update_stock(&product.id, -7).await.unwrap();
        let low = repo.list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert!(low[0].is_low_stock());
    }

    #[tokio::test]
    async fn test_search_by_name_or_item_code() {
        let repo = repo().await;
        let cable = repo.create(&cable()).await.unwrap();
        let charger = repo
            .create(&NewProduct {
                name: "Wall Charger".to_string(),
                item_code: Some("WC_20".to_string()),
                ..self::cable()
            })
            .await
            .unwrap();

        let hits = repo.search("Cable", DEFAULT_SEARCH_LIMIT).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, cable.id);

        let hits = repo.search("  wc_2 ", DEFAULT_SEARCH_LIMIT).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, charger.id);

        // `_` is matched literally
        assert!(repo.search("uc_01", DEFAULT_SEARCH_LIMIT).await.unwrap().is_empty());

        assert_eq!(repo.search("", DEFAULT_SEARCH_LIMIT).await.unwrap().len(), 2);
        assert_eq!(repo.search("", 1).await.unwrap().len(), 1);

        repo.soft_delete(&charger.id).await.unwrap();
        assert!(repo.search("charger", DEFAULT_SEARCH_LIMIT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let repo = repo().await;
        let product = repo.create(&cable()).await.unwrap();
        repo.soft_delete(&product.id).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 0);
        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }
}
