//! Non-blocking notification dispatch.
//!
//! [`Notifier`] is a cheap, cloneable handle over a bounded queue. A single
//! background task drains the queue into a [`NotificationChannel`]. Callers
//! never wait on delivery: a full queue drops the message, and send failures
//! are logged and discarded.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Destination for notification text.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver one message.
    async fn send(&self, text: &str) -> Result<()>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;
}

/// Handle used by the discovery loop to fire notifications.
#[derive(Clone, Debug)]
pub struct Notifier {
    queue: Option<mpsc::Sender<String>>,
}

impl Notifier {
    /// A notifier that discards everything.
    pub fn disabled() -> Self {
        Self { queue: None }
    }

    /// Start the delivery task for `channel`.
    ///
    /// The task ends once every `Notifier` clone is dropped and the queue is
    /// drained; await the returned handle to let pending messages go out.
    pub fn spawn(channel: Arc<dyn NotificationChannel>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));

        let task = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                match channel.send(&text).await {
                    Ok(()) => debug!("Notification sent via {}", channel.name()),
                    Err(e) => debug!("Notification via {} failed: {}", channel.name(), e),
                }
            }
        });

        (Self { queue: Some(tx) }, task)
    }

    /// Whether messages go anywhere.
    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    /// Queue a message without waiting. Never fails the caller.
    pub fn notify(&self, text: String) {
        let Some(queue) = &self.queue else {
            return;
        };

        match queue.try_send(text) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Notification queue full, dropping message"),
            Err(TrySendError::Closed(_)) => debug!("Notification task stopped, dropping message"),
        }
    }
}
