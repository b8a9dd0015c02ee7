//! Telegram Bot channel: long polling plus message sending via the Bot API.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::Stream;
use hackbot_core::config::TelegramConfig;
use hackbot_core::error::{HackError, Result};
use hackbot_core::traits::Channel;
use hackbot_core::types::{IncomingMessage, Keyboard, OutgoingMessage, Payload};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Telegram Bot channel. Cheap to clone; clones share the update offset.
#[derive(Clone)]
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    last_update_id: Arc<AtomicI64>,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            last_update_id: Arc::new(AtomicI64::new(0)),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "https://api.telegram.org/bot{}/{}",
            self.config.bot_token, method
        )
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| HackError::Channel(format!("Telegram {method} failed: {e}")))?;

        let body: TelegramApiResponse<T> = response
            .json()
            .await
            .map_err(|e| HackError::Channel(format!("Invalid Telegram {method} response: {e}")))?;

        if !body.ok {
            return Err(HackError::Delivery(format!(
                "Telegram {method} error: {}",
                body.description.unwrap_or_default()
            )));
        }
        body.result
            .ok_or_else(|| HackError::Channel(format!("Telegram {method} returned no result")))
    }

    /// Get updates using long polling.
    pub async fn get_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let offset = self.last_update_id.load(Ordering::Relaxed) + 1;
        let updates: Vec<TelegramUpdate> = self
            .call(
                "getUpdates",
                serde_json::json!({
                    "offset": offset,
                    "timeout": self.config.poll_timeout_secs,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;

        if let Some(last) = updates.last() {
            self.last_update_id.store(last.update_id, Ordering::Relaxed);
        }
        Ok(updates)
    }

    /// Send a text message with optional reply markup.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = keyboard.map(reply_markup) {
            body["reply_markup"] = markup;
        }
        let _: serde_json::Value = self.call("sendMessage", body).await?;
        Ok(())
    }

    /// Dismiss the loading spinner on a pressed button.
    pub async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                serde_json::json!({ "callback_query_id": callback_id }),
            )
            .await?;
        Ok(())
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", serde_json::json!({})).await
    }

    /// Start polling loop; returns a stream of IncomingMessages.
    pub fn start_polling(&self) -> TelegramPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let channel = self.clone();

        tokio::spawn(async move {
            tracing::info!("📡 Telegram polling loop started");
            let pause = Duration::from_secs(channel.config.poll_interval_secs);

            loop {
                match channel.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            if let Some(query) = &update.callback_query {
                                let channel = channel.clone();
                                let id = query.id.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = channel.answer_callback_query(&id).await {
                                        tracing::debug!("answerCallbackQuery failed: {e}");
                                    }
                                });
                            }
                            if let Some(msg) = update.to_incoming() {
                                if tx.send(msg).is_err() {
                                    tracing::info!("📡 Telegram polling stopped (receiver dropped)");
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("📡 Telegram polling error: {e}");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }

                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }
        });

        TelegramPollingStream { rx }
    }
}

/// Stream of incoming Telegram messages from polling.
pub struct TelegramPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<IncomingMessage>,
}

impl Stream for TelegramPollingStream {
    type Item = IncomingMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&self) -> Result<()> {
        if self.config.bot_token.is_empty() {
            return Err(HackError::Config("telegram.bot_token is not set".into()));
        }
        let me = self.get_me().await?;
        tracing::info!(
            "🤖 Telegram bot: @{} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name
        );
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        self.send_message(
            message.recipient,
            &message.content,
            message.keyboard.as_ref(),
        )
        .await
    }
}

/// Render a keyboard as Bot API `reply_markup`.
fn reply_markup(keyboard: &Keyboard) -> serde_json::Value {
    match keyboard {
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<serde_json::Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| serde_json::json!({ "text": b.label, "callback_data": b.data }))
                        .collect()
                })
                .collect();
            serde_json::json!({ "inline_keyboard": rows })
        }
        Keyboard::RequestContact(label) => serde_json::json!({
            "keyboard": [[{ "text": label, "request_contact": true }]],
            "one_time_keyboard": true,
            "resize_keyboard": true,
        }),
        Keyboard::Remove => serde_json::json!({ "remove_keyboard": true }),
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub contact: Option<TelegramContact>,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramContact {
    pub phone_number: String,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

impl TelegramUser {
    fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

/// `/start@my_bot args` → `start`.
fn parse_command(text: &str) -> Option<String> {
    let rest = text.strip_prefix('/')?;
    let word = rest.split_whitespace().next()?;
    let name = word.split('@').next().unwrap_or(word);
    (!name.is_empty()).then(|| name.to_lowercase())
}

impl TelegramUpdate {
    /// Convert to a Hackbot IncomingMessage. Only private chats with humans
    /// are considered.
    pub fn to_incoming(&self) -> Option<IncomingMessage> {
        let (from, payload) = if let Some(query) = &self.callback_query {
            (&query.from, Payload::Callback(query.data.clone()?))
        } else {
            let msg = self.message.as_ref()?;
            if msg.chat.chat_type != "private" {
                return None;
            }
            let from = msg.from.as_ref()?;
            let payload = if let Some(contact) = &msg.contact {
                // Only accept the sender's own number.
                if contact.user_id.is_some_and(|id| id != from.id) {
                    return None;
                }
                Payload::Contact(contact.phone_number.clone())
            } else {
                let text = msg.text.as_ref()?;
                match parse_command(text) {
                    Some(name) => Payload::Command(name),
                    None => Payload::Text(text.clone()),
                }
            };
            (from, payload)
        };

        if from.is_bot {
            return None;
        }

        Some(IncomingMessage {
            sender_name: Some(from.display_name()),
            username: from.username.clone(),
            ..IncomingMessage::new("telegram", from.id, payload)
        })
    }
}
