//! Best-effort notifications for confirmed discoveries.

pub mod dispatch;
pub mod error;
pub mod message;
pub mod telegram;

pub use dispatch::{NotificationChannel, Notifier};
pub use error::{NotifyError, Result};
pub use message::{discovery_message, escape_html};
pub use telegram::TelegramChannel;
