//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::User;
use tracing::{debug, error};

use crate::localization::t_lang;
use crate::models::Actor;

use super::router::{Reply, Router};
use super::ui_builder::{keyboard_from_affordances, split_message, MAX_MESSAGE_LEN};

/// Build the actor for an inbound Telegram user
pub fn actor_from_user(user: &User) -> Actor {
    Actor::new(user.id.0 as i64, user.username.as_deref())
        .with_language(user.language_code.as_deref())
}

/// Send a reply, splitting long text. Buttons go on the last chunk.
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<()> {
    let chunks = split_message(&reply.text, MAX_MESSAGE_LEN);
    let last = chunks.len().saturating_sub(1);

    for (i, chunk) in chunks.into_iter().enumerate() {
        if i == last && !reply.buttons.is_empty() {
            bot.send_message(chat_id, chunk)
                .reply_markup(keyboard_from_affordances(&reply.buttons))
                .await?;
        } else {
            bot.send_message(chat_id, chunk).await?;
        }
    }
    Ok(())
}

pub async fn message_handler(bot: Bot, msg: Message, router: Arc<Router>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without sender");
        return Ok(());
    };
    let actor = actor_from_user(user);

    let reply = match msg.text() {
        Some(text) => {
            debug!(user_id = actor.id, chat_id = %msg.chat.id, "Received text message");
            router.handle_text(&actor, text).await
        }
        None => Reply::text(t_lang("unsupported-message", actor.lang())),
    };

    if let Err(e) = send_reply(&bot, msg.chat.id, reply).await {
        error!(user_id = actor.id, error = %e, "Failed to send reply");
        return Err(e);
    }
    Ok(())
}
