//! Dialogue Manager module for turning conversation steps into replies

use tracing::debug;

use crate::errors::{MarketError, MarketResult};
use crate::localization::{t_args_lang, t_lang};
use crate::marketplace::Marketplace;
use crate::models::{Actor, EditField};
use crate::product_flow::FlowResponse;

use super::router::{render_error, Reply};
use super::ui_builder::format_price;

/// Handle a message that is not a command
pub async fn handle_free_text(market: &Marketplace, actor: &Actor, text: &str) -> MarketResult<Reply> {
    let lang = actor.lang();
    let response = market.products.handle_input(actor, text).await?;
    debug!(user_id = actor.id, ?response, "Conversation step handled");

    let text = match response {
        FlowResponse::NotInFlow => t_lang("text-response", lang),
        FlowResponse::AskPrice => t_lang("wizard-ask-price", lang),
        FlowResponse::AskStock => t_lang("wizard-ask-stock", lang),
        FlowResponse::NameRejected => t_lang("wizard-name-empty", lang),
        FlowResponse::PriceRejected => t_lang("wizard-price-invalid", lang),
        FlowResponse::StockRejected => t_lang("wizard-stock-invalid", lang),
        FlowResponse::Cancelled => t_lang("wizard-cancelled", lang),
        FlowResponse::Created(product) => t_args_lang(
            "wizard-created",
            &[
                ("name", &product.name),
                ("price", &format_price(product.price_cents)),
                ("stock", &product.stock.to_string()),
                ("id", &product.id.to_string()),
            ],
            lang,
        ),
        FlowResponse::Edited { product, field: EditField::Price } => t_args_lang(
            "price-updated",
            &[("price", &format_price(product.price_cents))],
            lang,
        ),
        FlowResponse::Edited { product, field: EditField::Stock } => {
            t_args_lang("stock-updated", &[("stock", &product.stock.to_string())], lang)
        }
        FlowResponse::EditFailed { error: MarketError::InvalidPrice(_), .. } => {
            t_lang("edit-aborted-price", lang)
        }
        FlowResponse::EditFailed { error: MarketError::InvalidStock(_), .. } => {
            t_lang("edit-aborted-stock", lang)
        }
        FlowResponse::EditFailed { error, .. } => return Ok(render_error(&error, lang)),
    };

    Ok(Reply::text(text))
}
