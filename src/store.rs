//! # Storage Abstraction
//!
//! The table-like store behind the directory and the catalog. Each mutating
//! method is a single atomic write. `PgStore` backs production deployments,
//! `MemoryStore` backs tests and database-less runs.

use async_trait::async_trait;

use crate::errors::MarketResult;
use crate::models::{Product, Role, User};

/// Listing constraints for products. Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub owner_id: Option<i64>,
    pub in_stock_only: bool,
}

impl ProductFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn available() -> Self {
        Self {
            owner_id: None,
            in_stock_only: true,
        }
    }

    pub fn owned_by(owner_id: i64) -> Self {
        Self {
            owner_id: Some(owner_id),
            in_stock_only: false,
        }
    }
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn get_user(&self, telegram_id: i64) -> MarketResult<Option<User>>;

    /// Case-insensitive lookup by handle, without the leading `@`
    async fn find_user_by_handle(&self, handle: &str) -> MarketResult<Option<User>>;

    /// Insert the user if absent, returning whether a row was created
    async fn insert_user(&self, telegram_id: i64, handle: Option<&str>, role: Role)
        -> MarketResult<bool>;

    async fn update_handle(&self, telegram_id: i64, handle: Option<&str>) -> MarketResult<()>;

    async fn update_role(&self, telegram_id: i64, role: Role) -> MarketResult<()>;

    async fn update_language(&self, telegram_id: i64, language_code: &str) -> MarketResult<()>;

    async fn create_product(
        &self,
        owner_id: i64,
        name: &str,
        price_cents: i64,
        stock: i64,
    ) -> MarketResult<Product>;

    async fn get_product(&self, id: i64) -> MarketResult<Option<Product>>;

    async fn list_products(&self, filter: &ProductFilter) -> MarketResult<Vec<Product>>;

    /// Products whose name or owner handle contains `query`, case-insensitively
    async fn search_products(&self, query: &str) -> MarketResult<Vec<Product>>;

    /// Returns false when no product has this id
    async fn update_price(&self, id: i64, price_cents: i64) -> MarketResult<bool>;

    async fn update_stock(&self, id: i64, stock: i64) -> MarketResult<bool>;

    async fn delete_product(&self, id: i64) -> MarketResult<bool>;

    async fn get_setting(&self, key: &str) -> MarketResult<Option<String>>;

    async fn set_setting(&self, key: &str, value: &str) -> MarketResult<()>;
}
