//! Conversation state kept per identity between messages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::models::EditField;

pub const MAX_PRODUCT_NAME_LEN: usize = 255;

/// What the next free-text message from a user means
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    WaitingForName,
    WaitingForPrice {
        name: String,
    },
    WaitingForStock {
        name: String,
        price_cents: i64,
    },
    /// One-shot: cleared by the next message whatever it contains
    PendingEdit {
        product_id: i64,
        field: EditField,
    },
}

impl ConversationState {
    pub fn is_product_entry(&self) -> bool {
        matches!(
            self,
            ConversationState::WaitingForName
                | ConversationState::WaitingForPrice { .. }
                | ConversationState::WaitingForStock { .. }
        )
    }
}

/// Explicit identity -> conversation map. One in-progress flow per identity;
/// starting a new one replaces the old.
#[derive(Debug, Default)]
pub struct Conversations {
    states: Mutex<HashMap<i64, ConversationState>>,
}

impl Conversations {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, identity: i64) -> ConversationState {
        self.states
            .lock()
            .await
            .get(&identity)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set(&self, identity: i64, state: ConversationState) {
        let mut states = self.states.lock().await;
        if state == ConversationState::Idle {
            states.remove(&identity);
        } else {
            states.insert(identity, state);
        }
    }

    /// Remove and return the state, leaving the identity idle
    pub async fn take(&self, identity: i64) -> ConversationState {
        self.states
            .lock()
            .await
            .remove(&identity)
            .unwrap_or_default()
    }

    pub async fn clear(&self, identity: i64) {
        self.states.lock().await.remove(&identity);
    }
}

/// Validates a product name input
pub fn validate_product_name(name: &str) -> Result<String, &'static str> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}
