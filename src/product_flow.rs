//! # Product Entry Flow
//!
//! Three ways to touch the catalog as a seller:
//!
//! - **Quick add**: `"Name" price stock` on one line.
//! - **Wizard**: name, then price, then stock, one message each. Invalid
//!   input re-prompts without advancing; `cancel` ends it without saving.
//! - **Edit**: a pending edit marker makes the next message the new price or
//!   stock. The marker is consumed by that message whatever it contains, so
//!   a malformed value aborts the edit instead of re-prompting.
//!
//! Sellers and the admin may create products; only the owner or the admin
//! may edit or delete one.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::CatalogStore;
use crate::dialogue::{validate_product_name, ConversationState, Conversations};
use crate::directory::UserDirectory;
use crate::errors::{MarketError, MarketResult};
use crate::models::{Actor, EditField, Product};
use crate::price::{parse_price, parse_stock};

/// Words that abort an in-progress entry when sent as plain text
const CANCEL_WORDS: &[&str] = &["cancel", "cancelar", "stop"];

/// What happened to a free-text message routed through the flow
#[derive(Debug)]
pub enum FlowResponse {
    /// No conversation in progress for this identity
    NotInFlow,
    AskPrice,
    AskStock,
    NameRejected,
    PriceRejected,
    StockRejected,
    Created(Product),
    Cancelled,
    Edited { product: Product, field: EditField },
    /// The pending edit was consumed without applying anything
    EditFailed { field: EditField, error: MarketError },
}

pub struct ProductEntryFlow {
    directory: Arc<UserDirectory>,
    catalog: CatalogStore,
    conversations: Arc<Conversations>,
}

impl ProductEntryFlow {
    pub fn new(
        directory: Arc<UserDirectory>,
        catalog: CatalogStore,
        conversations: Arc<Conversations>,
    ) -> Self {
        Self {
            directory,
            catalog,
            conversations,
        }
    }

    async fn require_seller(&self, actor: &Actor) -> MarketResult<()> {
        if self.directory.can_sell(actor).await? {
            Ok(())
        } else {
            warn!(user_id = actor.id, "Product entry refused, not a seller");
            Err(MarketError::unauthorized(actor.id, "add products"))
        }
    }

    /// Load a product the actor may modify: its owner or the admin
    pub async fn authorize_product(
        &self,
        actor: &Actor,
        product_id: i64,
        action: &'static str,
    ) -> MarketResult<Product> {
        let product = self
            .catalog
            .get(product_id)
            .await?
            .ok_or(MarketError::ProductNotFound(product_id))?;

        if product.owner_id == actor.id
            || self.directory.is_admin(actor.id, actor.handle.as_deref()).await?
        {
            Ok(product)
        } else {
            warn!(user_id = actor.id, product_id, owner_id = product.owner_id, action, "Product access refused");
            Err(MarketError::unauthorized(actor.id, action))
        }
    }

    /// Create a product from `name price stock`; the name may be quoted
    pub async fn quick_add(&self, actor: &Actor, raw_line: &str) -> MarketResult<Product> {
        self.require_seller(actor).await?;

        let tokens = tokenize(raw_line)?;
        if tokens.len() < 3 {
            return Err(MarketError::BadFormat(format!(
                "expected name, price and stock, got {} field(s)",
                tokens.len()
            )));
        }

        let (name_tokens, rest) = tokens.split_at(tokens.len() - 2);
        let name = validate_product_name(&name_tokens.join(" ")).map_err(|_| MarketError::InvalidName)?;
        let price_cents = parse_price(&rest[0]).ok_or_else(|| MarketError::InvalidPrice(rest[0].clone()))?;
        let stock = parse_stock(&rest[1]).ok_or_else(|| MarketError::InvalidStock(rest[1].clone()))?;

        self.catalog.create(actor.id, &name, price_cents, stock).await
    }

    /// Begin the step-by-step entry, replacing whatever was in progress
    pub async fn start_wizard(&self, actor: &Actor) -> MarketResult<()> {
        self.require_seller(actor).await?;
        self.conversations
            .set(actor.id, ConversationState::WaitingForName)
            .await;
        debug!(user_id = actor.id, "Product wizard started");
        Ok(())
    }

    /// Abort any entry or pending edit. Returns whether something was in progress.
    pub async fn cancel(&self, identity: i64) -> bool {
        let previous = self.conversations.take(identity).await;
        if previous != ConversationState::Idle {
            debug!(user_id = identity, ?previous, "Conversation cancelled");
        }
        previous != ConversationState::Idle
    }

    /// Route one free-text message according to the identity's conversation state
    pub async fn handle_input(&self, actor: &Actor, text: &str) -> MarketResult<FlowResponse> {
        let state = self.conversations.get(actor.id).await;
        let input = text.trim();

        if state.is_product_entry()
            && CANCEL_WORDS.iter().any(|w| w.eq_ignore_ascii_case(input))
        {
            self.conversations.clear(actor.id).await;
            return Ok(FlowResponse::Cancelled);
        }

        match state {
            ConversationState::Idle => Ok(FlowResponse::NotInFlow),
            ConversationState::WaitingForName => match validate_product_name(input) {
                Ok(name) => {
                    self.conversations
                        .set(actor.id, ConversationState::WaitingForPrice { name })
                        .await;
                    Ok(FlowResponse::AskPrice)
                }
                Err(_) => Ok(FlowResponse::NameRejected),
            },
            ConversationState::WaitingForPrice { name } => match parse_price(input) {
                Some(price_cents) => {
                    self.conversations
                        .set(actor.id, ConversationState::WaitingForStock { name, price_cents })
                        .await;
                    Ok(FlowResponse::AskStock)
                }
                None => Ok(FlowResponse::PriceRejected),
            },
            ConversationState::WaitingForStock { name, price_cents } => {
                let Some(stock) = parse_stock(input) else {
                    return Ok(FlowResponse::StockRejected);
                };
                self.conversations.clear(actor.id).await;
                self.require_seller(actor).await?;
                let product = self.catalog.create(actor.id, &name, price_cents, stock).await?;
                Ok(FlowResponse::Created(product))
            }
            ConversationState::PendingEdit { product_id, field } => {
                self.conversations.clear(actor.id).await;
                let result = match field {
                    EditField::Price => self.edit_price(actor, product_id, input).await,
                    EditField::Stock => self.edit_stock(actor, product_id, input).await,
                };
                Ok(match result {
                    Ok(product) => FlowResponse::Edited { product, field },
                    Err(MarketError::Storage(reason)) => return Err(MarketError::Storage(reason)),
                    Err(error) => {
                        info!(user_id = actor.id, product_id, error = %error, "Pending edit aborted");
                        FlowResponse::EditFailed { field, error }
                    }
                })
            }
        }
    }

    /// Arm a pending edit; the identity's next message carries the value
    pub async fn begin_edit(
        &self,
        actor: &Actor,
        product_id: i64,
        field: EditField,
    ) -> MarketResult<Product> {
        let product = self.authorize_product(actor, product_id, "edit this product").await?;
        self.conversations
            .set(actor.id, ConversationState::PendingEdit { product_id, field })
            .await;
        debug!(user_id = actor.id, product_id, ?field, "Pending edit armed");
        Ok(product)
    }

    pub async fn edit_price(&self, actor: &Actor, product_id: i64, raw_value: &str) -> MarketResult<Product> {
        let mut product = self.authorize_product(actor, product_id, "edit this product").await?;
        let price_cents =
            parse_price(raw_value).ok_or_else(|| MarketError::InvalidPrice(raw_value.to_string()))?;
        self.catalog.update_price(product_id, price_cents).await?;
        product.price_cents = price_cents;
        Ok(product)
    }

    pub async fn edit_stock(&self, actor: &Actor, product_id: i64, raw_value: &str) -> MarketResult<Product> {
        let mut product = self.authorize_product(actor, product_id, "edit this product").await?;
        let stock =
            parse_stock(raw_value).ok_or_else(|| MarketError::InvalidStock(raw_value.to_string()))?;
        self.catalog.update_stock(product_id, stock).await?;
        product.stock = stock;
        Ok(product)
    }

    pub async fn delete(&self, actor: &Actor, product_id: i64) -> MarketResult<Product> {
        let product = self.authorize_product(actor, product_id, "delete this product").await?;
        self.catalog.delete(product_id).await?;
        info!(user_id = actor.id, product_id, "Product removed from catalog");
        Ok(product)
    }
}

/// Split on whitespace, keeping quoted segments together. Straight and
/// typographic double quotes and single quotes are recognised. A quote only
/// opens a segment at the start of a token, so `Kid's` stays one word.
pub fn tokenize(line: &str) -> MarketResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut closing: Option<char> = None;

    for c in line.chars() {
        if let Some(close) = closing {
            if c == close {
                closing = None;
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            '"' if !in_token => closing = Some('"'),
            '\'' if !in_token => closing = Some('\''),
            '“' if !in_token => closing = Some('”'),
            '«' if !in_token => closing = Some('»'),
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
                continue;
            }
            c => current.push(c),
        }
        in_token = true;
    }

    if closing.is_some() {
        return Err(MarketError::BadFormat("unterminated quote".to_string()));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quoted_name() {
        assert_eq!(
            tokenize(r#""Mint Gum" 1.20 300"#).unwrap(),
            vec!["Mint Gum", "1.20", "300"]
        );
        assert_eq!(
            tokenize("“Chicle menta”  1,20   300").unwrap(),
            vec!["Chicle menta", "1,20", "300"]
        );
        assert_eq!(tokenize("'Gum' 1 2").unwrap(), vec!["Gum", "1", "2"]);
    }

    #[test]
    fn test_tokenize_edge_cases() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
        assert_eq!(tokenize(r#""" 1 2"#).unwrap(), vec!["", "1", "2"]);
        assert!(matches!(
            tokenize(r#""Mint Gum 1.20 300"#),
            Err(MarketError::BadFormat(_))
        ));
    }

    #[test]
    fn test_tokenize_apostrophe_inside_word() {
        assert_eq!(
            tokenize("Kid's 1.20 300").unwrap(),
            vec!["Kid's", "1.20", "300"]
        );
        assert_eq!(
            tokenize("Kid's Mom's 1.20 300").unwrap(),
            vec!["Kid's", "Mom's", "1.20", "300"]
        );
        assert_eq!(
            tokenize(r#""Kid's toy" 2 1"#).unwrap(),
            vec!["Kid's toy", "2", "1"]
        );
    }
}
