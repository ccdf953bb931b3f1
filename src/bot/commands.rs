//! Commands understood by the bot

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Market bot commands:")]
pub enum Command {
    #[command(description = "greeting and help for your role")]
    Start(String),
    #[command(description = "show this help")]
    Help,
    #[command(description = "ask the administrator to become a seller")]
    RequestSeller,
    #[command(description = "\"Name\" Price Stock: add a product in one line")]
    AddProductQuick(String),
    #[command(description = "add a product step by step")]
    AddProductWizard,
    #[command(description = "cancel the current product entry or edit")]
    Cancel,
    #[command(description = "every product in the catalog")]
    ListCatalog,
    #[command(description = "products in stock right now")]
    Available,
    #[command(description = "<text>: search by product name or seller")]
    Search(String),
    #[command(description = "your products, with edit buttons")]
    MyProducts,
    #[command(description = "<id> [price]: change a product's price")]
    EditPrice(String),
    #[command(description = "<id> [stock]: change a product's stock")]
    EditStock(String),
    #[command(description = "<id>: delete a product")]
    DeleteProduct(String),
    #[command(description = "<id or @user>: approve a seller (admin)")]
    Approve(String),
    #[command(description = "<id or @user>: reject a seller (admin)")]
    Reject(String),
    #[command(description = "<id or @user>: revoke seller status (admin)")]
    Revoke(String),
    #[command(description = "register yourself as administrator")]
    ClaimAdmin,
}
