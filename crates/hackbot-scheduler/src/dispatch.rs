//! Notification dispatch: throttled fan-out over a chat channel.

use std::sync::Arc;
use std::time::Duration;

use hackbot_core::models::ParticipantId;
use hackbot_core::traits::Channel;
use hackbot_core::types::OutgoingMessage;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends plain-text notifications, pausing between messages to stay under
/// the transport's rate limits. Per-recipient failures are logged, never
/// returned.
pub struct NotificationDispatcher {
    channel: Arc<dyn Channel>,
    delay: Duration,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn Channel>, delay: Duration) -> Self {
        Self { channel, delay }
    }

    /// Deliver one message. Returns whether it went out.
    pub async fn send(&self, recipient: ParticipantId, text: &str) -> bool {
        match self
            .channel
            .send(OutgoingMessage::text(recipient, text))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "📭 Delivery to {recipient} via {} failed: {e}",
                    self.channel.name()
                );
                false
            }
        }
    }

    pub async fn send_many(&self, recipients: &[ParticipantId], text: &str) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (i, recipient) in recipients.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.send(*recipient, text).await {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }
}
