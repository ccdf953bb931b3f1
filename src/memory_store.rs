//! # In-Memory Store
//!
//! `MarketStore` kept in process memory. All writes go through one async
//! lock, so every mutation is atomic with respect to concurrent handlers.
//! Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::errors::MarketResult;
use crate::models::{Product, Role, User};
use crate::store::{MarketStore, ProductFilter};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<i64, User>,
    products: BTreeMap<i64, Product>,
    settings: HashMap<String, String>,
    next_product_id: i64,
    /// Per-user write sequence, the in-process stand-in for `updated_at`
    touched: HashMap<i64, u64>,
    clock: u64,
}

impl Tables {
    fn touch(&mut self, telegram_id: i64) {
        self.clock += 1;
        self.touched.insert(telegram_id, self.clock);
    }

    fn with_owner_handle(&self, product: &Product) -> Product {
        let mut product = product.clone();
        product.owner_handle = self
            .users
            .get(&product.owner_id)
            .and_then(|u| u.handle.clone());
        product
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn get_user(&self, telegram_id: i64) -> MarketResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&telegram_id).cloned())
    }

    /// When several users carry the same handle, the most recently updated wins
    async fn find_user_by_handle(&self, handle: &str) -> MarketResult<Option<User>> {
        let wanted = handle.trim_start_matches('@').to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.handle.as_deref().map(str::to_lowercase).as_deref() == Some(wanted.as_str()))
            .max_by_key(|u| (tables.touched.get(&u.telegram_id).copied(), u.telegram_id))
            .cloned())
    }

    async fn insert_user(
        &self,
        telegram_id: i64,
        handle: Option<&str>,
        role: Role,
    ) -> MarketResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&telegram_id) {
            return Ok(false);
        }
        tables.users.insert(
            telegram_id,
            User {
                telegram_id,
                handle: handle.map(|h| h.to_string()),
                role,
                language_code: None,
                created_at: Utc::now(),
            },
        );
        tables.touch(telegram_id);
        Ok(true)
    }

    async fn update_handle(&self, telegram_id: i64, handle: Option<&str>) -> MarketResult<()> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&telegram_id) else {
            return Ok(());
        };
        if user.handle.as_deref() != handle {
            user.handle = handle.map(|h| h.to_string());
            tables.touch(telegram_id);
        }
        Ok(())
    }

    async fn update_role(&self, telegram_id: i64, role: Role) -> MarketResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&telegram_id) {
            user.role = role;
            tables.touch(telegram_id);
        }
        Ok(())
    }

    async fn update_language(&self, telegram_id: i64, language_code: &str) -> MarketResult<()> {
        if let Some(user) = self.tables.write().await.users.get_mut(&telegram_id) {
            user.language_code = Some(language_code.to_string());
        }
        Ok(())
    }

    async fn create_product(
        &self,
        owner_id: i64,
        name: &str,
        price_cents: i64,
        stock: i64,
    ) -> MarketResult<Product> {
        let mut tables = self.tables.write().await;
        tables.next_product_id += 1;
        let product = Product {
            id: tables.next_product_id,
            owner_id,
            owner_handle: None,
            name: name.to_string(),
            price_cents,
            stock,
            created_at: Utc::now(),
        };
        tables.products.insert(product.id, product.clone());
        Ok(tables.with_owner_handle(&product))
    }

    async fn get_product(&self, id: i64) -> MarketResult<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).map(|p| tables.with_owner_handle(p)))
    }

    async fn list_products(&self, filter: &ProductFilter) -> MarketResult<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .rev()
            .filter(|p| filter.owner_id.map_or(true, |owner| p.owner_id == owner))
            .filter(|p| !filter.in_stock_only || p.is_available())
            .map(|p| tables.with_owner_handle(p))
            .collect())
    }

    async fn search_products(&self, query: &str) -> MarketResult<Vec<Product>> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .rev()
            .map(|p| tables.with_owner_handle(p))
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p
                        .owner_handle
                        .as_deref()
                        .is_some_and(|h| h.to_lowercase().contains(&needle))
            })
            .collect())
    }

    async fn update_price(&self, id: i64, price_cents: i64) -> MarketResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.products.get_mut(&id) {
            Some(product) => {
                product.price_cents = price_cents;
                true
            }
            None => false,
        })
    }

    async fn update_stock(&self, id: i64, stock: i64) -> MarketResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.products.get_mut(&id) {
            Some(product) => {
                product.stock = stock;
                true
            }
            None => false,
        })
    }

    async fn delete_product(&self, id: i64) -> MarketResult<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn get_setting(&self, key: &str) -> MarketResult<Option<String>> {
        Ok(self.tables.read().await.settings.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> MarketResult<()> {
        self.tables
            .write()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_product_ids_are_sequential_and_listed_newest_first() {
        let store = MemoryStore::new();
        store.insert_user(1, Some("ana"), Role::Seller).await.unwrap();

        let first = store.create_product(1, "Gum", 120, 300).await.unwrap();
        let second = store.create_product(1, "Mints", 90, 0).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(second.owner_handle.as_deref(), Some("ana"));

        let all = store.list_products(&ProductFilter::all()).await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 1]);

        let available = store.list_products(&ProductFilter::available()).await.unwrap();
        assert_eq!(available.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_deleted_ids_are_not_reused() {
        let store = MemoryStore::new();
        let first = store.create_product(1, "Gum", 120, 300).await.unwrap();
        assert!(store.delete_product(first.id).await.unwrap());
        let second = store.create_product(1, "Gum", 120, 300).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_insert_user_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.insert_user(5, None, Role::Buyer).await.unwrap());
        assert!(!store.insert_user(5, Some("late"), Role::Seller).await.unwrap());
        let user = store.get_user(5).await.unwrap().unwrap();
        assert_eq!(user.role, Role::Buyer);
        assert_eq!(user.handle, None);
    }

    #[tokio::test]
    async fn test_shared_handle_resolves_to_latest_update() {
        let store = MemoryStore::new();
        store.insert_user(1, Some("ana"), Role::Buyer).await.unwrap();
        store.insert_user(2, Some("other"), Role::Buyer).await.unwrap();
        store.update_handle(2, Some("Ana")).await.unwrap();

        let found = store.find_user_by_handle("@ana").await.unwrap().unwrap();
        assert_eq!(found.telegram_id, 2);

        store.update_role(1, Role::Seller).await.unwrap();
        for _ in 0..10 {
            let found = store.find_user_by_handle("ANA").await.unwrap().unwrap();
            assert_eq!(found.telegram_id, 1);
        }

        // an unchanged handle is not an update
        store.update_handle(2, Some("Ana")).await.unwrap();
        let found = store.find_user_by_handle("ana").await.unwrap().unwrap();
        assert_eq!(found.telegram_id, 1);
    }

    #[tokio::test]
    async fn test_language_is_stored_per_user() {
        let store = MemoryStore::new();
        store.insert_user(1, Some("ana"), Role::Buyer).await.unwrap();
        store.update_language(1, "es").await.unwrap();
        store.update_language(2, "es").await.unwrap();

        let user = store.get_user(1).await.unwrap().unwrap();
        assert_eq!(user.language_code.as_deref(), Some("es"));
        assert!(store.get_user(2).await.unwrap().is_none());
    }
}
