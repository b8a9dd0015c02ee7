//! Channel trait: the chat transport the bot talks through.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::OutgoingMessage;

/// An outbound chat transport.
///
/// Inbound traffic is transport specific (polling, webhooks) and is pushed
/// to the dialog layer by the binary, so only the sending half is shared.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name (e.g., "telegram").
    fn name(&self) -> &str;

    /// Verify credentials and reachability.
    async fn connect(&self) -> Result<()>;

    /// Deliver one message. Fails with `HackError::Delivery` for this recipient only.
    async fn send(&self, message: OutgoingMessage) -> Result<()>;
}
