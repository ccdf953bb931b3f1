//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `commands`: the command set registered with Telegram
//! - `router`: transport-independent routing of commands, text and callbacks
//! - `dialogue_manager`: free-text input for in-progress conversations
//! - `ui_builder`: catalog formatting and inline keyboards
//! - `message_handler` / `callback_handler`: teloxide endpoints

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

pub mod callback_handler;
pub mod commands;
pub mod dialogue_manager;
pub mod message_handler;
pub mod router;
pub mod ui_builder;

pub use callback_handler::callback_handler;
pub use commands::Command;
pub use message_handler::message_handler;
pub use router::{Reply, Router};

/// Dispatcher schema: messages and callback queries, with an `Arc<Router>` dependency
pub fn build_schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
