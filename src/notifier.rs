//! # Outbound Notifications
//!
//! The message sender used by the workflows, the decision affordances
//! (inline buttons) attached to messages and the payloads they carry.
//!
//! Deliveries are best-effort: the state change that triggers a message is
//! committed before the send, and a failed send is logged, never propagated.

use async_trait::async_trait;
use std::fmt;
use teloxide::prelude::*;
use tracing::{debug, warn};

use crate::bot::ui_builder::keyboard_from_affordances;
use crate::errors::{MarketError, MarketResult};

/// Action carried by a callback button, encoded as `<action>:<subject id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPayload {
    Approve(i64),
    Reject(i64),
    EditPrice(i64),
    EditStock(i64),
    Delete(i64),
}

impl CallbackPayload {
    /// Split on the first `:` into action tag and subject id
    pub fn parse(data: &str) -> Option<Self> {
        let (action, subject) = data.split_once(':')?;
        let id: i64 = subject.trim().parse().ok()?;
        match action {
            "approve" => Some(CallbackPayload::Approve(id)),
            "reject" => Some(CallbackPayload::Reject(id)),
            "edit_price" => Some(CallbackPayload::EditPrice(id)),
            "edit_stock" => Some(CallbackPayload::EditStock(id)),
            "delete" => Some(CallbackPayload::Delete(id)),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackPayload::Approve(id) => write!(f, "approve:{id}"),
            CallbackPayload::Reject(id) => write!(f, "reject:{id}"),
            CallbackPayload::EditPrice(id) => write!(f, "edit_price:{id}"),
            CallbackPayload::EditStock(id) => write!(f, "edit_stock:{id}"),
            CallbackPayload::Delete(id) => write!(f, "delete:{id}"),
        }
    }
}

/// A clickable option: label plus opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordance {
    pub label: String,
    pub payload: CallbackPayload,
}

impl Affordance {
    pub fn new(label: impl Into<String>, payload: CallbackPayload) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text` to the private chat of `target`, with buttons laid out in rows
    async fn send(&self, target: i64, text: &str, affordances: &[Vec<Affordance>])
        -> MarketResult<()>;
}

/// Send and swallow delivery failures. Returns whether the message went out.
pub async fn notify_best_effort(
    notifier: &dyn Notifier,
    target: i64,
    text: &str,
    affordances: &[Vec<Affordance>],
) -> bool {
    match notifier.send(target, text, affordances).await {
        Ok(()) => {
            debug!(target_id = target, "Notification delivered");
            true
        }
        Err(e) => {
            warn!(target_id = target, error = %e, "Notification delivery failed");
            false
        }
    }
}

/// Notifier backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(
        &self,
        target: i64,
        text: &str,
        affordances: &[Vec<Affordance>],
    ) -> MarketResult<()> {
        let request = self.bot.send_message(ChatId(target), text);
        let result = if affordances.is_empty() {
            request.await
        } else {
            request
                .reply_markup(keyboard_from_affordances(affordances))
                .await
        };

        result
            .map(|_| ())
            .map_err(|e| MarketError::NotificationDeliveryFailed {
                target,
                reason: e.to_string(),
            })
    }
}
