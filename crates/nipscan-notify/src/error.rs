use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("notification API error: status {status}, {message}")]
    Api { status: u16, message: String },

    #[error("notifications are not configured")]
    Disabled,
}
