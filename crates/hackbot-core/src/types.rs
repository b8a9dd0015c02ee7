//! Transport-neutral message types exchanged between channels and the dialog layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ParticipantId;

/// Incoming message from a chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub channel: String,
    pub sender_id: ParticipantId,
    pub sender_name: Option<String>,
    pub username: Option<String>,
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
}

/// What the participant actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// `/name`, without the slash and any bot suffix.
    Command(String),
    Text(String),
    /// A shared phone number.
    Contact(String),
    /// Button press carrying its interaction data.
    Callback(String),
}

impl IncomingMessage {
    pub fn new(channel: impl Into<String>, sender_id: ParticipantId, payload: Payload) -> Self {
        Self {
            channel: channel.into(),
            sender_id,
            sender_name: None,
            username: None,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Outgoing message to a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub recipient: ParticipantId,
    pub content: String,
    pub keyboard: Option<Keyboard>,
}

impl OutgoingMessage {
    pub fn text(recipient: ParticipantId, content: impl Into<String>) -> Self {
        Self {
            recipient,
            content: content.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Reply markup. Rendering is up to the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
    /// Rows of buttons attached to the message.
    Inline(Vec<Vec<Button>>),
    /// One-time keyboard asking the participant to share their phone.
    RequestContact(String),
    /// Hide a previously shown reply keyboard.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}
