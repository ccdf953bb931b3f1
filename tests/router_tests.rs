//! End-to-end routing tests: text commands, conversations and button presses

mod common;

use std::sync::Arc;

use common::*;
use marketbot::bot::Router;
use marketbot::marketplace::AdminSettings;
use marketbot::models::{Actor, Role};
use marketbot::notifier::CallbackPayload;

const BOT_NAME: &str = "market_bot";

fn router(test: &TestMarket) -> Router {
    Router::new(Arc::clone(&test.market), BOT_NAME)
}

#[tokio::test]
async fn test_start_depends_on_role() {
    let test = setup_market().await;
    let router = router(&test);

    let buyer_reply = router.handle_text(&buyer(), "/start").await;
    assert!(buyer_reply.text.contains("/request_seller"));
    assert!(!buyer_reply.text.contains("/approve"));

    let seller_reply = router.handle_text(&seller(), "/start").await;
    assert!(seller_reply.text.contains("/add_product_quick"));

    let admin_reply = router.handle_text(&admin(), "/help").await;
    assert!(admin_reply.text.contains("/approve"));
    assert!(admin_reply.text.contains("/add_product_quick"));
}

#[tokio::test]
async fn test_first_contact_registers_user() {
    let test = setup_market().await;
    let router = router(&test);
    let newcomer = Actor::new(6000, Some("eve"));

    router.handle_text(&newcomer, "hello").await;
    assert_eq!(role(&test.store, 6000).await, Some(Role::Buyer));
}

#[tokio::test]
async fn test_full_seller_journey() {
    let test = setup_market().await;
    let router = router(&test);

    let reply = router.handle_text(&buyer(), "/request_seller").await;
    assert_eq!(reply.text, "Request sent. You will be notified once it has been reviewed.");

    let request = &test.notifier.sent_to(ADMIN_ID)[0];
    let approve = request.affordances[0][0].payload;
    assert_eq!(approve, CallbackPayload::Approve(BUYER_ID));

    let reply = router.handle_callback(&admin(), &approve.to_string()).await;
    assert!(reply.edit_original);
    assert_eq!(reply.text, "Request approved: @bob is now a seller.");
    assert_eq!(role(&test.store, BUYER_ID).await, Some(Role::Seller));

    let reply = router
        .handle_text(&buyer(), r#"/add_product_quick "Mint Gum" 1,20 300"#)
        .await;
    assert_eq!(reply.text, "Product added: Mint Gum | price 1.20€ | stock 300 (id 1)");

    let reply = router.handle_text(&buyer(), "/list_catalog").await;
    assert_eq!(reply.text, "ID:1 | @bob | Mint Gum | 1.20€ | stock:300");
}

#[tokio::test]
async fn test_non_admin_button_press_is_refused() {
    let test = setup_market().await;
    let router = router(&test);
    router.handle_text(&buyer(), "/request_seller").await;

    let reply = router.handle_callback(&seller(), "approve:3000").await;
    assert_eq!(reply.text, "Access denied. Only the administrator can do this.");
    assert!(!reply.edit_original);
    assert_eq!(role(&test.store, BUYER_ID).await, Some(Role::Pending));
}

#[tokio::test]
async fn test_button_press_refreshes_handle_and_language() {
    let test = setup_market().await;
    let router = router(&test);
    router.handle_text(&seller(), "/add_product_quick Gum 1 10").await;

    let renamed = Actor::new(SELLER_ID, Some("ana_new")).with_language(Some("es"));
    let reply = router.handle_callback(&renamed, "edit_price:1").await;
    assert_eq!(reply.text, "Envía el nuevo precio para el producto 1:");

    let user = test.market.directory.get(SELLER_ID).await.unwrap().unwrap();
    assert_eq!(user.handle.as_deref(), Some("ana_new"));
    assert_eq!(user.language_code.as_deref(), Some("es"));
    let resolved = test.market.directory.resolve("@ana_new").await.unwrap().unwrap();
    assert_eq!(resolved.telegram_id, SELLER_ID);
    assert!(test.market.directory.resolve("@ana").await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_callback_payload() {
    let test = setup_market().await;
    let reply = router(&test).handle_callback(&admin(), "approve:someone").await;
    assert_eq!(reply.text, marketbot::localization::t_lang("error-invalid-payload", None));
}

#[tokio::test]
async fn test_admin_text_commands() {
    let test = setup_market().await;
    let router = router(&test);
    router.handle_text(&buyer(), "/request_seller").await;

    let reply = router.handle_text(&seller(), "/approve 3000").await;
    assert_eq!(reply.text, "Access denied. Only the administrator can do this.");

    let reply = router.handle_text(&admin(), "/reject @bob").await;
    assert_eq!(reply.text, "Request rejected: @bob.");
    assert_eq!(role(&test.store, BUYER_ID).await, Some(Role::Rejected));

    let reply = router.handle_text(&admin(), "/revoke @ana").await;
    assert_eq!(reply.text, "@ana is no longer a seller.");
    assert_eq!(role(&test.store, SELLER_ID).await, Some(Role::Buyer));

    let reply = router.handle_text(&admin(), "/approve @ghost").await;
    assert_eq!(reply.text, "User not found.");
}

#[tokio::test]
async fn test_wizard_over_text_messages() {
    let test = setup_market().await;
    let router = router(&test);
    let seller = seller();

    router.handle_text(&seller, "/add_product_wizard").await;
    router.handle_text(&seller, "Gum").await;
    let reply = router.handle_text(&seller, "abc").await;
    assert_eq!(reply.text, "Invalid price. Try again (e.g. 1,20):");
    router.handle_text(&seller, "1,20").await;
    let reply = router.handle_text(&seller, "300").await;
    assert!(reply.text.contains("• Name: Gum"));
    assert!(reply.text.contains("• Price: 1.20€"));

    let products = test.market.catalog.list_by_owner(SELLER_ID).await.unwrap();
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn test_commands_during_wizard_are_routed_as_commands() {
    let test = setup_market().await;
    let router = router(&test);
    let seller = seller();

    router.handle_text(&seller, "/add_product_wizard").await;
    let reply = router.handle_text(&seller, "/cancel").await;
    assert_eq!(reply.text, "Cancelled. Nothing was saved.");
    let reply = router.handle_text(&seller, "/cancel").await;
    assert_eq!(reply.text, "There is nothing to cancel.");
}

#[tokio::test]
async fn test_buyer_cannot_add() {
    let test = setup_market().await;
    let reply = router(&test).handle_text(&buyer(), "/add_product_quick Gum 1 2").await;
    assert_eq!(reply.text, "You need to be a seller to add products. Use /request_seller.");
}

#[tokio::test]
async fn test_my_products_buttons_and_edit_in_place() {
    let test = setup_market().await;
    let router = router(&test);
    let seller = seller();
    router.handle_text(&seller, "/add_product_quick Gum 1 10").await;

    let reply = router.handle_text(&seller, "/my_products").await;
    assert_eq!(reply.buttons.len(), 1);
    let edit_price = reply.buttons[0][0].payload;
    assert_eq!(edit_price, CallbackPayload::EditPrice(1));

    let reply = router.handle_callback(&seller, &edit_price.to_string()).await;
    assert_eq!(reply.text, "Send the new price for product 1:");
    let reply = router.handle_text(&seller, "2,50").await;
    assert_eq!(reply.text, "Price updated to 2.50€.");

    let reply = router.handle_callback(&seller, "edit_stock:1").await;
    assert_eq!(reply.text, "Send the new stock for product 1:");
    let reply = router.handle_text(&seller, "plenty").await;
    assert_eq!(
        reply.text,
        "Invalid stock, the edit was aborted. Use /edit_stock to try again."
    );

    let product = test.market.catalog.get(1).await.unwrap().unwrap();
    assert_eq!(product.price_cents, 250);
    assert_eq!(product.stock, 10);
}

#[tokio::test]
async fn test_direct_edit_and_delete_commands() {
    let test = setup_market().await;
    let router = router(&test);
    router.handle_text(&seller(), "/add_product_quick Gum 1 10").await;

    let reply = router.handle_text(&seller(), "/edit_stock 1 0").await;
    assert_eq!(reply.text, "Stock updated to 0.");
    let reply = router.handle_text(&buyer(), "/delete_product 1").await;
    assert_eq!(reply.text, "You don't have permission to delete this product.");
    let reply = router.handle_text(&seller(), "/delete_product x").await;
    assert_eq!(reply.text, "Invalid product id.");
    let reply = router.handle_text(&seller(), "/delete_product 1").await;
    assert_eq!(reply.text, "Product deleted.");
    let reply = router.handle_text(&seller(), "/delete_product 1").await;
    assert_eq!(reply.text, "Product not found.");
}

#[tokio::test]
async fn test_available_and_search() {
    let test = setup_market().await;
    let router = router(&test);
    router.handle_text(&seller(), "/add_product_quick Gum 1 0").await;
    router.handle_text(&seller(), "/add_product_quick Tea 2 5").await;

    let reply = router.handle_text(&buyer(), "/available").await;
    assert_eq!(reply.text, "ID:2 | @ana | Tea | 2.00€ | stock:5");

    let reply = router.handle_text(&buyer(), "/search gum").await;
    assert_eq!(reply.text, "ID:1 | @ana | Gum | 1.00€ | stock:0 (sold out)");

    let reply = router.handle_text(&buyer(), "/search ANA").await;
    assert!(reply.text.contains("ID:1 | @ana | Gum"));
    assert!(reply.text.contains("ID:2 | @ana | Tea"));
}

#[tokio::test]
async fn test_claim_admin_command() {
    let test = market_with(AdminSettings::default()).await;
    let router = router(&test);

    let reply = router.handle_text(&buyer(), "/start").await;
    assert!(reply.text.contains("/claim_admin"));

    let reply = router.handle_text(&admin(), "/claim_admin").await;
    assert_eq!(reply.text, format!("Registered as administrator (id={ADMIN_ID})."));
    let reply = router.handle_text(&buyer(), "/claim_admin").await;
    assert_eq!(reply.text, "An administrator is already registered.");
}

#[tokio::test]
async fn test_spanish_replies() {
    let test = setup_market().await;
    let router = router(&test);
    let buyer = buyer().with_language(Some("es-ES"));

    let reply = router.handle_text(&buyer, "/delete_product 42").await;
    assert_eq!(reply.text, "Producto no encontrado.");
}

#[tokio::test]
async fn test_unknown_command_and_plain_text() {
    let test = setup_market().await;
    let router = router(&test);

    let reply = router.handle_text(&buyer(), "/teleport").await;
    assert_eq!(reply.text, "Unknown command. Use /help to see the available commands.");
    let reply = router.handle_text(&buyer(), "hi there").await;
    assert_eq!(reply.text, "I didn't understand that. Use /help to see the available commands.");
}
