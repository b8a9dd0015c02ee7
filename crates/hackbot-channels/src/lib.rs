//! # Hackbot Channels
//! Chat transports implementing `hackbot_core::Channel`.

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramPollingStream};
