//! Routes inbound commands, free text and callback payloads to the
//! workflows and turns their outcomes into replies. Nothing here touches
//! Telegram directly, so the whole dispatch table runs in tests.

use std::sync::Arc;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info};

use crate::approval::{RevokeOutcome, SellerRequestOutcome};
use crate::directory::ClaimOutcome;
use crate::errors::{ErrorKind, MarketError, MarketResult};
use crate::localization::{t_args_lang, t_lang};
use crate::marketplace::Marketplace;
use crate::models::{Actor, EditField, Role};
use crate::notifier::{Affordance, CallbackPayload};

use super::commands::Command;
use super::dialogue_manager::handle_free_text;
use super::ui_builder::{create_product_management_keyboard, format_price, format_product_list};

/// A message for the actor who triggered the event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<Vec<Affordance>>,
    /// Replace the message whose button was pressed instead of sending a new one
    pub edit_original: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
            edit_original: false,
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Vec<Affordance>>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn editing_original(mut self) -> Self {
        self.edit_original = true;
        self
    }
}

/// Turn a workflow error into a user-facing reply
pub fn render_error(err: &MarketError, language_code: Option<&str>) -> Reply {
    let key = match err {
        MarketError::BadFormat(_) => "product-quick-usage",
        MarketError::InvalidPrice(_) => "product-invalid-price",
        MarketError::InvalidStock(_) => "product-invalid-stock",
        MarketError::InvalidName => "product-invalid-name",
        MarketError::Unauthorized { action, .. } => match *action {
            "add products" => "product-not-seller",
            "edit this product" => "product-forbidden-edit",
            "delete this product" => "product-forbidden-delete",
            _ => "error-unauthorized-admin",
        },
        MarketError::UserNotFound(_) => "error-user-not-found",
        MarketError::ProductNotFound(_) => "product-not-found",
        MarketError::NoAdminConfigured => "seller-request-no-admin",
        MarketError::NotificationDeliveryFailed { .. } | MarketError::Storage(_) => {
            "error-processing-failed"
        }
    };
    match err.kind() {
        ErrorKind::Internal | ErrorKind::NotificationDeliveryFailed => {
            error!(error = %err, "Request failed")
        }
        _ => debug!(error = %err, "Request refused"),
    }
    Reply::text(t_lang(key, language_code))
}

/// `<product id> [value]` as used by the edit and delete commands
fn parse_product_args(args: &str) -> Result<Option<(i64, Option<String>)>, ()> {
    let args = args.trim();
    if args.is_empty() {
        return Ok(None);
    }
    let (id, rest) = match args.split_once(char::is_whitespace) {
        Some((id, rest)) => (id, Some(rest.trim().to_string()).filter(|r| !r.is_empty())),
        None => (args, None),
    };
    let id = id.trim_start_matches('#').parse::<i64>().map_err(|_| ())?;
    Ok(Some((id, rest)))
}

pub struct Router {
    market: Arc<Marketplace>,
    bot_username: String,
}

impl Router {
    pub fn new(market: Arc<Marketplace>, bot_username: impl Into<String>) -> Self {
        Self {
            market,
            bot_username: bot_username.into(),
        }
    }

    pub fn market(&self) -> &Marketplace {
        &self.market
    }

    /// Handle a text message: a command, or input for a conversation
    pub async fn handle_text(&self, actor: &Actor, text: &str) -> Reply {
        let lang = actor.lang();
        if let Err(e) = self.market.directory.record(actor).await {
            return render_error(&e, lang);
        }

        let result = if text.starts_with('/') {
            match Command::parse(text, &self.bot_username) {
                Ok(command) => {
                    debug!(user_id = actor.id, ?command, "Received command");
                    self.handle_command(actor, command).await
                }
                Err(e) => {
                    debug!(user_id = actor.id, error = %e, "Unrecognized command");
                    Ok(Reply::text(t_lang("unknown-command", lang)))
                }
            }
        } else {
            handle_free_text(&self.market, actor, text).await
        };

        result.unwrap_or_else(|e| render_error(&e, lang))
    }

    /// Handle an inline button press carrying `payload`
    pub async fn handle_callback(&self, actor: &Actor, payload: &str) -> Reply {
        let lang = actor.lang();
        debug!(user_id = actor.id, payload, "Received callback");
        if let Err(e) = self.market.directory.record(actor).await {
            return render_error(&e, lang);
        }

        let Some(payload) = CallbackPayload::parse(payload) else {
            return Reply::text(t_lang("error-invalid-payload", lang));
        };

        let result = match payload {
            CallbackPayload::Approve(id) => self.decide(actor, id, true).await.map(Reply::editing_original),
            CallbackPayload::Reject(id) => self.decide(actor, id, false).await.map(Reply::editing_original),
            CallbackPayload::EditPrice(id) => self.begin_edit(actor, id, EditField::Price).await,
            CallbackPayload::EditStock(id) => self.begin_edit(actor, id, EditField::Stock).await,
            CallbackPayload::Delete(id) => self.delete_product(actor, id).await,
        };

        result.unwrap_or_else(|e| render_error(&e, lang))
    }

    async fn handle_command(&self, actor: &Actor, command: Command) -> MarketResult<Reply> {
        let lang = actor.lang();
        let products = &self.market.products;
        let catalog = &self.market.catalog;

        match command {
            Command::Start(_) | Command::Help => self.welcome(actor).await,
            Command::RequestSeller => self.request_seller(actor).await,
            Command::AddProductQuick(args) => {
                let product = products.quick_add(actor, &args).await?;
                Ok(Reply::text(t_args_lang(
                    "product-added",
                    &[
                        ("name", &product.name),
                        ("price", &format_price(product.price_cents)),
                        ("stock", &product.stock.to_string()),
                        ("id", &product.id.to_string()),
                    ],
                    lang,
                )))
            }
            Command::AddProductWizard => {
                products.start_wizard(actor).await?;
                Ok(Reply::text(t_lang("wizard-start", lang)))
            }
            Command::Cancel => {
                let key = if products.cancel(actor.id).await {
                    "wizard-cancelled"
                } else {
                    "nothing-to-cancel"
                };
                Ok(Reply::text(t_lang(key, lang)))
            }
            Command::ListCatalog => {
                let list = catalog.list_all().await?;
                Ok(Reply::text(format_product_list(&list, "catalog-empty", lang)))
            }
            Command::Available => {
                let list = catalog.list_available().await?;
                Ok(Reply::text(format_product_list(&list, "catalog-available-empty", lang)))
            }
            Command::Search(query) => {
                if query.trim().is_empty() {
                    return Ok(Reply::text(t_lang("search-usage", lang)));
                }
                let list = catalog.search(&query).await?;
                Ok(Reply::text(format_product_list(&list, "search-empty", lang)))
            }
            Command::MyProducts => {
                let list = catalog.list_by_owner(actor.id).await?;
                Ok(Reply::text(format_product_list(&list, "my-products-empty", lang))
                    .with_buttons(create_product_management_keyboard(&list, lang)))
            }
            Command::EditPrice(args) => self.edit_command(actor, &args, EditField::Price).await,
            Command::EditStock(args) => self.edit_command(actor, &args, EditField::Stock).await,
            Command::DeleteProduct(args) => match parse_product_args(&args) {
                Ok(Some((id, _))) => self.delete_product(actor, id).await,
                Ok(None) => Ok(Reply::text(t_lang("delete-usage", lang))),
                Err(()) => Ok(Reply::text(t_lang("invalid-product-id", lang))),
            },
            Command::Approve(args) => self.decide_command(actor, &args, Some(true)).await,
            Command::Reject(args) => self.decide_command(actor, &args, Some(false)).await,
            Command::Revoke(args) => self.decide_command(actor, &args, None).await,
            Command::ClaimAdmin => {
                let key = match self.market.directory.claim_admin(actor).await? {
                    ClaimOutcome::Claimed => "admin-claimed",
                    ClaimOutcome::AlreadyAdmin => "admin-already-you",
                    ClaimOutcome::AdminAlreadyClaimed => "admin-already-claimed",
                };
                Ok(Reply::text(t_args_lang(key, &[("user_id", &actor.id.to_string())], lang)))
            }
        }
    }

    async fn welcome(&self, actor: &Actor) -> MarketResult<Reply> {
        let lang = actor.lang();
        let directory = &self.market.directory;
        let is_admin = directory.is_admin(actor.id, actor.handle.as_deref()).await?;
        let role = directory.role_of(actor.id).await?;

        let mut sections = vec![t_lang("welcome-title", lang), t_lang("welcome-buyer", lang)];
        match role {
            _ if is_admin => {
                sections.push(t_lang("welcome-seller", lang));
                sections.push(t_lang("welcome-admin", lang));
            }
            Role::Seller => sections.push(t_lang("welcome-seller", lang)),
            Role::Pending => sections.push(t_lang("welcome-pending", lang)),
            Role::Rejected => sections.push(t_lang("welcome-rejected", lang)),
            Role::Buyer | Role::Admin => {}
        }
        if directory.admin_id().await.is_none() {
            sections.push(t_lang("welcome-claim-admin", lang));
        }

        Ok(Reply::text(sections.join("\n\n")))
    }

    async fn request_seller(&self, actor: &Actor) -> MarketResult<Reply> {
        let key = match self.market.approval.request_seller_status(actor).await? {
            SellerRequestOutcome::Submitted { .. } => "seller-request-submitted",
            SellerRequestOutcome::AlreadyPending => "seller-request-already-pending",
            SellerRequestOutcome::AlreadySeller => "seller-request-already-seller",
            SellerRequestOutcome::NoAdminConfigured => "seller-request-no-admin",
        };
        Ok(Reply::text(t_lang(key, actor.lang())))
    }

    async fn decide(&self, actor: &Actor, subject_id: i64, approve: bool) -> MarketResult<Reply> {
        let decision = self.market.approval.decide(actor, subject_id, approve).await?;
        let key = if approve { "decision-approved" } else { "decision-rejected" };
        Ok(Reply::text(t_args_lang(
            key,
            &[("user", &decision.subject.display_name())],
            actor.lang(),
        )))
    }

    /// `approve`, `reject` (Some(bool)) or `revoke` (None) by id or @handle
    async fn decide_command(
        &self,
        actor: &Actor,
        args: &str,
        approve: Option<bool>,
    ) -> MarketResult<Reply> {
        let lang = actor.lang();
        let directory = &self.market.directory;
        directory.require_admin(actor, "manage sellers").await?;

        let reference = args.split_whitespace().next().unwrap_or("");
        if reference.is_empty() {
            let usage = match approve {
                Some(true) => "usage-approve",
                Some(false) => "usage-reject",
                None => "usage-revoke",
            };
            return Ok(Reply::text(t_lang(usage, lang)));
        }

        let subject = directory
            .resolve(reference)
            .await?
            .ok_or_else(|| MarketError::UserNotFound(reference.to_string()))?;

        match approve {
            Some(approve) => self.decide(actor, subject.telegram_id, approve).await,
            None => {
                let (key, subject) = match self.market.approval.revoke(actor, subject.telegram_id).await? {
                    RevokeOutcome::Revoked { subject, .. } => ("seller-revoked", subject),
                    RevokeOutcome::NotASeller { subject } => ("revoke-not-seller", subject),
                };
                Ok(Reply::text(t_args_lang(key, &[("user", &subject.display_name())], lang)))
            }
        }
    }

    /// `/edit_price <id> <value>` edits directly; without a value it arms a pending edit
    async fn edit_command(&self, actor: &Actor, args: &str, field: EditField) -> MarketResult<Reply> {
        let lang = actor.lang();
        let usage = match field {
            EditField::Price => "edit-price-usage",
            EditField::Stock => "edit-stock-usage",
        };

        let (id, value) = match parse_product_args(args) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return Ok(Reply::text(t_lang(usage, lang))),
            Err(()) => return Ok(Reply::text(t_lang("invalid-product-id", lang))),
        };

        let Some(value) = value else {
            return self.begin_edit(actor, id, field).await;
        };

        let products = &self.market.products;
        let reply = match field {
            EditField::Price => {
                let product = products.edit_price(actor, id, &value).await?;
                t_args_lang("price-updated", &[("price", &format_price(product.price_cents))], lang)
            }
            EditField::Stock => {
                let product = products.edit_stock(actor, id, &value).await?;
                t_args_lang("stock-updated", &[("stock", &product.stock.to_string())], lang)
            }
        };
        Ok(Reply::text(reply))
    }

    async fn begin_edit(&self, actor: &Actor, product_id: i64, field: EditField) -> MarketResult<Reply> {
        self.market.products.begin_edit(actor, product_id, field).await?;
        let key = match field {
            EditField::Price => "edit-price-prompt",
            EditField::Stock => "edit-stock-prompt",
        };
        Ok(Reply::text(t_args_lang(
            key,
            &[("id", &product_id.to_string())],
            actor.lang(),
        )))
    }

    async fn delete_product(&self, actor: &Actor, product_id: i64) -> MarketResult<Reply> {
        let product = self.market.products.delete(actor, product_id).await?;
        info!(user_id = actor.id, product_id = product.id, "Delete command completed");
        Ok(Reply::text(t_lang("product-deleted", actor.lang())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_args() {
        assert_eq!(parse_product_args(""), Ok(None));
        assert_eq!(parse_product_args("12"), Ok(Some((12, None))));
        assert_eq!(parse_product_args("#12  2,50 "), Ok(Some((12, Some("2,50".to_string())))));
        assert_eq!(parse_product_args("abc 3"), Err(()));
    }

    #[test]
    fn test_render_error_messages() {
        let reply = render_error(&MarketError::unauthorized(1, "delete this product"), None);
        assert_eq!(reply.text, "You don't have permission to delete this product.");

        let reply = render_error(&MarketError::ProductNotFound(9), Some("es"));
        assert_eq!(reply.text, "Producto no encontrado.");
    }
}
