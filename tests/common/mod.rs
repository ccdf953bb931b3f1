//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use marketbot::errors::{MarketError, MarketResult};
use marketbot::marketplace::{AdminSettings, Marketplace};
use marketbot::memory_store::MemoryStore;
use marketbot::models::{Actor, Role};
use marketbot::notifier::{Affordance, Notifier};
use marketbot::store::MarketStore;

pub const ADMIN_ID: i64 = 1000;
pub const SELLER_ID: i64 = 2000;
pub const BUYER_ID: i64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub target: i64,
    pub text: String,
    pub affordances: Vec<Vec<Affordance>>,
}

/// Records every message instead of sending it
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, target: i64) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.target == target)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, target: i64, text: &str, affordances: &[Vec<Affordance>]) -> MarketResult<()> {
        self.sent.lock().unwrap().push(SentMessage {
            target,
            text: text.to_string(),
            affordances: affordances.to_vec(),
        });
        Ok(())
    }
}

/// Every delivery fails, as when the recipient blocked the bot
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, target: i64, _text: &str, _affordances: &[Vec<Affordance>]) -> MarketResult<()> {
        Err(MarketError::NotificationDeliveryFailed {
            target,
            reason: "Forbidden: bot was blocked by the user".to_string(),
        })
    }
}

pub struct TestMarket {
    pub market: Arc<Marketplace>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn admin() -> Actor {
    Actor::new(ADMIN_ID, Some("boss"))
}

pub fn seller() -> Actor {
    Actor::new(SELLER_ID, Some("ana"))
}

pub fn buyer() -> Actor {
    Actor::new(BUYER_ID, Some("bob"))
}

pub async fn market_with(admin: AdminSettings) -> TestMarket {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let market = Marketplace::new(store.clone(), notifier.clone(), admin)
        .await
        .unwrap();
    TestMarket {
        market: Arc::new(market),
        store,
        notifier,
    }
}

/// Admin bound to `ADMIN_ID`, plus an approved seller and a plain buyer
pub async fn setup_market() -> TestMarket {
    let test = market_with(AdminSettings {
        admin_id: Some(ADMIN_ID),
        admin_handle: None,
    })
    .await;

    let directory = &test.market.directory;
    directory.upsert(ADMIN_ID, Some("boss"), None).await.unwrap();
    directory
        .upsert(SELLER_ID, Some("ana"), Some(Role::Seller))
        .await
        .unwrap();
    directory.upsert(BUYER_ID, Some("bob"), None).await.unwrap();
    test
}

pub async fn role(store: &MemoryStore, id: i64) -> Option<Role> {
    store.get_user(id).await.unwrap().map(|u| u.role)
}
