use anyhow::Result;
use async_trait::async_trait;

/// Outbound notification channel. Messages may carry a constrained HTML subset
/// (bold, hyperlink) and must be pre-escaped by the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a rendered message to one recipient.
    async fn send(&self, recipient: &str, message: &str) -> Result<()>;

    /// Get the name of the notification channel
    fn channel_name(&self) -> &'static str;
}
