//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::localization::{t_args_lang, t_lang};
use crate::models::Product;
use crate::notifier::{Affordance, CallbackPayload};
use crate::price::format_cents;

pub const CURRENCY_SYMBOL: &str = "€";

/// Telegram rejects messages longer than this
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Products that get management buttons in one keyboard
pub const MAX_KEYBOARD_PRODUCTS: usize = 25;

pub fn format_price(cents: i64) -> String {
    format!("{}{}", format_cents(cents), CURRENCY_SYMBOL)
}

/// One catalog line: `ID:3 | @seller | Gum | 1.20€ | stock:300`
pub fn format_product_line(product: &Product, language_code: Option<&str>) -> String {
    let seller = match &product.owner_handle {
        Some(handle) => format!("@{handle}"),
        None => format!("#{}", product.owner_id),
    };

    let mut line = format!(
        "ID:{} | {} | {} | {} | stock:{}",
        product.id,
        seller,
        product.name,
        format_price(product.price_cents),
        product.stock
    );
    if !product.is_available() {
        line.push_str(&format!(" ({})", t_lang("catalog-sold-out", language_code)));
    }
    line
}

/// Format products one per line, or `empty_key` when there are none
pub fn format_product_list(
    products: &[Product],
    empty_key: &str,
    language_code: Option<&str>,
) -> String {
    if products.is_empty() {
        return t_lang(empty_key, language_code);
    }

    products
        .iter()
        .map(|p| format_product_line(p, language_code))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Edit price / edit stock / delete buttons for each product
pub fn create_product_management_keyboard(
    products: &[Product],
    language_code: Option<&str>,
) -> Vec<Vec<Affordance>> {
    products
        .iter()
        .take(MAX_KEYBOARD_PRODUCTS)
        .map(|product| {
            let id = product.id.to_string();
            vec![
                Affordance::new(
                    t_args_lang("button-edit-price", &[("id", &id)], language_code),
                    CallbackPayload::EditPrice(product.id),
                ),
                Affordance::new(
                    t_args_lang("button-edit-stock", &[("id", &id)], language_code),
                    CallbackPayload::EditStock(product.id),
                ),
                Affordance::new(
                    t_args_lang("button-delete", &[("id", &id)], language_code),
                    CallbackPayload::Delete(product.id),
                ),
            ]
        })
        .collect()
}

/// Convert affordance rows into a Telegram inline keyboard
pub fn keyboard_from_affordances(rows: &[Vec<Affordance>]) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|a| InlineKeyboardButton::callback(a.label.clone(), a.payload.to_string()))
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Split text on line boundaries into chunks of at most `max_len` bytes.
/// A single line longer than `max_len` is cut at a char boundary.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let mut line = line;
        while line.len() > max_len {
            let mut cut = max_len;
            while !line.is_char_boundary(cut) {
                cut -= 1;
            }
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
        }

        let needed = if current.is_empty() { line.len() } else { current.len() + 1 + line.len() };
        if needed > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i64, stock: i64, handle: Option<&str>) -> Product {
        Product {
            id,
            owner_id: 77,
            owner_handle: handle.map(|h| h.to_string()),
            name: "Mint Gum".to_string(),
            price_cents: 120,
            stock,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_product_line() {
        assert_eq!(
            format_product_line(&product(3, 300, Some("ana")), None),
            "ID:3 | @ana | Mint Gum | 1.20€ | stock:300"
        );
        assert_eq!(
            format_product_line(&product(4, 0, None), None),
            "ID:4 | #77 | Mint Gum | 1.20€ | stock:0 (sold out)"
        );
    }

    #[test]
    fn test_management_keyboard_payloads() {
        let rows = create_product_management_keyboard(&[product(5, 1, None)], None);
        assert_eq!(rows.len(), 1);
        let payloads: Vec<_> = rows[0].iter().map(|a| a.payload).collect();
        assert_eq!(
            payloads,
            vec![
                CallbackPayload::EditPrice(5),
                CallbackPayload::EditStock(5),
                CallbackPayload::Delete(5)
            ]
        );
        assert_eq!(rows[0][0].label, "✏️ Price #5");
    }

    #[test]
    fn test_split_message() {
        assert_eq!(split_message("short", 10), vec!["short"]);
        assert_eq!(split_message("", 10), vec![""]);
        assert_eq!(split_message("aaaa\nbbbb\ncccc", 9), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(split_message("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);

        let chunks = split_message(&"line\n".repeat(2000), MAX_MESSAGE_LEN);
        assert!(chunks.iter().all(|c| c.len() <= MAX_MESSAGE_LEN));
        assert!(chunks.len() > 1);
    }
}
