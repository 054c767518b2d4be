//! Telegram delivery over teloxide.
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use teloxide::RequestError;

use super::{DeliveryError, Notifier};
use crate::config::ChatTarget;

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: &str) -> Self {
        Self::new(Bot::new(token))
    }
}

fn recipient(chat: &ChatTarget) -> Recipient {
    match chat {
        ChatTarget::Id(id) => Recipient::Id(ChatId(*id)),
        ChatTarget::Username(name) => Recipient::ChannelUsername(name.clone()),
    }
}

/// Sort a Bot API failure into the retry classes understood by the delivery loop.
pub fn delivery_error(err: RequestError) -> DeliveryError {
    match err {
        RequestError::RetryAfter(secs) => DeliveryError::RateLimited(secs),
        RequestError::Network(e) => DeliveryError::Transient(e.to_string()),
        RequestError::Io(e) => DeliveryError::Transient(e.to_string()),
        other => DeliveryError::Permanent(other.to_string()),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat: &ChatTarget, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(recipient(chat), text.to_string())
            .await
            .map(|_| ())
            .map_err(delivery_error)
    }
}
