//! Callback Handler module for inline keyboard button presses

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error};

use super::message_handler::{actor_from_user, send_reply};
use super::router::Router;
use super::ui_builder::keyboard_from_affordances;

pub async fn callback_handler(bot: Bot, q: CallbackQuery, router: Arc<Router>) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    // Stop the button spinner before doing any work
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        error!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    let actor = actor_from_user(&q.from);
    let reply = router.handle_callback(&actor, data).await;

    let Some(message) = q.message.as_ref() else {
        // Inline-mode message: no chat to answer in, reply privately
        return send_reply(&bot, ChatId(actor.id), reply).await;
    };
    let chat_id = message.chat().id;

    if reply.edit_original {
        let mut request = bot.edit_message_text(chat_id, message.id(), reply.text.clone());
        if !reply.buttons.is_empty() {
            request = request.reply_markup(keyboard_from_affordances(&reply.buttons));
        }
        match request.await {
            Ok(_) => return Ok(()),
            Err(e) => {
                error!(user_id = actor.id, error = %e, "Failed to edit message, sending a new one");
            }
        }
    }

    send_reply(&bot, chat_id, reply).await
}
