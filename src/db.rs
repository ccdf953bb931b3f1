//! # PostgreSQL Store
//!
//! `MarketStore` implementation over a sqlx connection pool. The schema is
//! created idempotently at startup by [`init_database_schema`].

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::errors::{MarketError, MarketResult};
use crate::models::{Product, Role, User};
use crate::store::{MarketStore, ProductFilter};

const PRODUCT_COLUMNS: &str = "p.id, p.owner_id, u.handle AS owner_handle, p.name, p.price_cents, p.stock, p.created_at";

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> MarketResult<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id BIGINT PRIMARY KEY,
            handle TEXT,
            role TEXT NOT NULL DEFAULT 'buyer'
                CHECK (role IN ('buyer', 'pending', 'seller', 'rejected', 'admin')),
            language_code TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("ALTER TABLE users ADD COLUMN IF NOT EXISTS language_code TEXT")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id BIGSERIAL PRIMARY KEY,
            owner_id BIGINT NOT NULL REFERENCES users(telegram_id),
            name TEXT NOT NULL CHECK (name <> ''),
            price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
            stock BIGINT NOT NULL CHECK (stock >= 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS products_owner_idx ON products (owner_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS users_handle_idx ON users (LOWER(handle))")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn user_from_row(row: &PgRow) -> MarketResult<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        telegram_id: row.try_get("telegram_id")?,
        handle: row.try_get("handle")?,
        role: role.parse().map_err(MarketError::Storage)?,
        language_code: row.try_get("language_code")?,
        created_at: row.try_get("created_at")?,
    })
}

fn product_from_row(row: &PgRow) -> MarketResult<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        owner_handle: row.try_get("owner_handle")?,
        name: row.try_get("name")?,
        price_cents: row.try_get("price_cents")?,
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Escape `LIKE` wildcards so user text matches literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn get_user(&self, telegram_id: i64) -> MarketResult<Option<User>> {
        let row = sqlx::query(
            "SELECT telegram_id, handle, role, language_code, created_at FROM users WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_handle(&self, handle: &str) -> MarketResult<Option<User>> {
        let row = sqlx::query(
            "SELECT telegram_id, handle, role, language_code, created_at FROM users
             WHERE LOWER(handle) = LOWER($1)
             ORDER BY updated_at DESC
             LIMIT 1",
        )
        .bind(handle.trim_start_matches('@'))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(
        &self,
        telegram_id: i64,
        handle: Option<&str>,
        role: Role,
    ) -> MarketResult<bool> {
        let result = sqlx::query(
            "INSERT INTO users (telegram_id, handle, role) VALUES ($1, $2, $3)
             ON CONFLICT (telegram_id) DO NOTHING",
        )
        .bind(telegram_id)
        .bind(handle)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() > 0;
        if created {
            info!(user_id = telegram_id, role = %role, "User created");
        }
        Ok(created)
    }

    async fn update_handle(&self, telegram_id: i64, handle: Option<&str>) -> MarketResult<()> {
        sqlx::query(
            "UPDATE users SET handle = $1, updated_at = NOW()
             WHERE telegram_id = $2 AND handle IS DISTINCT FROM $1",
        )
        .bind(handle)
        .bind(telegram_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_role(&self, telegram_id: i64, role: Role) -> MarketResult<()> {
        sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE telegram_id = $2")
            .bind(role.as_str())
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_language(&self, telegram_id: i64, language_code: &str) -> MarketResult<()> {
        sqlx::query(
            "UPDATE users SET language_code = $1
             WHERE telegram_id = $2 AND language_code IS DISTINCT FROM $1",
        )
        .bind(language_code)
        .bind(telegram_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_product(
        &self,
        owner_id: i64,
        name: &str,
        price_cents: i64,
        stock: i64,
    ) -> MarketResult<Product> {
        let row = sqlx::query(&format!(
            "WITH p AS (
                INSERT INTO products (owner_id, name, price_cents, stock)
                VALUES ($1, $2, $3, $4)
                RETURNING id, owner_id, name, price_cents, stock, created_at
             )
             SELECT {PRODUCT_COLUMNS} FROM p LEFT JOIN users u ON u.telegram_id = p.owner_id"
        ))
        .bind(owner_id)
        .bind(name)
        .bind(price_cents)
        .bind(stock)
        .fetch_one(&self.pool)
        .await?;

        let product = product_from_row(&row)?;
        info!(product_id = product.id, owner_id, "Product created");
        Ok(product)
    }

    async fn get_product(&self, id: i64) -> MarketResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             LEFT JOIN users u ON u.telegram_id = p.owner_id
             WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self, filter: &ProductFilter) -> MarketResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             LEFT JOIN users u ON u.telegram_id = p.owner_id
             WHERE ($1::BIGINT IS NULL OR p.owner_id = $1)
               AND (NOT $2 OR p.stock > 0)
             ORDER BY p.id DESC"
        ))
        .bind(filter.owner_id)
        .bind(filter.in_stock_only)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), ?filter, "Listed products");
        rows.iter().map(product_from_row).collect()
    }

    async fn search_products(&self, query: &str) -> MarketResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             LEFT JOIN users u ON u.telegram_id = p.owner_id
             WHERE p.name ILIKE $1 OR u.handle ILIKE $1
             ORDER BY p.id DESC"
        ))
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    async fn update_price(&self, id: i64, price_cents: i64) -> MarketResult<bool> {
        let result = sqlx::query("UPDATE products SET price_cents = $1 WHERE id = $2")
            .bind(price_cents)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_stock(&self, id: i64, stock: i64) -> MarketResult<bool> {
        let result = sqlx::query("UPDATE products SET stock = $1 WHERE id = $2")
            .bind(stock)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: i64) -> MarketResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!(product_id = id, "Product deleted");
            Ok(true)
        } else {
            debug!(product_id = id, "No product to delete");
            Ok(false)
        }
    }

    async fn get_setting(&self, key: &str) -> MarketResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_setting(&self, key: &str, value: &str) -> MarketResult<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("gum"), "%gum%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
