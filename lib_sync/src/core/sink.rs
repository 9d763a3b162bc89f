//! # Notification Sink
//!
//! Transient, non-blocking delivery of user-facing messages (toasts). The
//! core never waits on a sink; a slow or gone presentation layer must not
//! stall polling or publishing.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSource {
    /// Returned by the notification poller.
    Poll,
    /// Returned by a mileage publish.
    Publish,
}

/// One toast-worthy message.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    /// Non-blank message text.
    pub text: String,
    /// Producer of the message.
    pub source: NotificationSource,
    /// When the core received it.
    pub received_at: DateTime<Utc>,
}

impl NotificationMessage {
    /// Stamps `text` with the current time.
    pub fn new(text: impl Into<String>, source: NotificationSource) -> Self {
        Self {
            text: text.into(),
            source,
            received_at: Utc::now(),
        }
    }
}

/// Receiver of user-facing messages. `push` must return promptly.
pub trait NotificationSink: Send + Sync + 'static {
    /// Hands a message to the presentation layer.
    fn push(&self, message: NotificationMessage);
}

/// Sink backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<NotificationMessage>,
}

impl ChannelSink {
    /// A sink and the receiver the presentation layer drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn push(&self, message: NotificationMessage) {
        if self.tx.send(message).is_err() {
            debug!("notification receiver dropped, message discarded");
        }
    }
}
