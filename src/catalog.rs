//! # Catalog Store
//!
//! Product records keyed by product id and owner. Callers check existence
//! and ownership before mutating; updates on unknown ids are no-ops.

use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::MarketResult;
use crate::models::Product;
use crate::store::{MarketStore, ProductFilter};

#[derive(Clone)]
pub struct CatalogStore {
    store: Arc<dyn MarketStore>,
}

impl CatalogStore {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        owner: i64,
        name: &str,
        price_cents: i64,
        stock: i64,
    ) -> MarketResult<Product> {
        let product = self.store.create_product(owner, name, price_cents, stock).await?;
        info!(
            product_id = product.id,
            owner_id = owner,
            price_cents,
            stock,
            "Catalog entry created"
        );
        Ok(product)
    }

    pub async fn get(&self, id: i64) -> MarketResult<Option<Product>> {
        self.store.get_product(id).await
    }

    /// Every product, sold-out ones included, newest first
    pub async fn list_all(&self) -> MarketResult<Vec<Product>> {
        self.store.list_products(&ProductFilter::all()).await
    }

    /// Products with stock left, newest first
    pub async fn list_available(&self) -> MarketResult<Vec<Product>> {
        self.store.list_products(&ProductFilter::available()).await
    }

    pub async fn list_by_owner(&self, owner: i64) -> MarketResult<Vec<Product>> {
        self.store.list_products(&ProductFilter::owned_by(owner)).await
    }

    pub async fn search(&self, query: &str) -> MarketResult<Vec<Product>> {
        let query = query.trim();
        let results = self.store.search_products(query).await?;
        debug!(query, matches = results.len(), "Catalog search completed");
        Ok(results)
    }

    pub async fn update_price(&self, id: i64, price_cents: i64) -> MarketResult<()> {
        if self.store.update_price(id, price_cents).await? {
            info!(product_id = id, price_cents, "Price updated");
        }
        Ok(())
    }

    pub async fn update_stock(&self, id: i64, stock: i64) -> MarketResult<()> {
        if self.store.update_stock(id, stock).await? {
            info!(product_id = id, stock, "Stock updated");
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> MarketResult<()> {
        self.store.delete_product(id).await?;
        Ok(())
    }
}
