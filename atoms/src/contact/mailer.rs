use async_trait::async_trait;

use super::model::ContactMessage;
use crate::error::ContactError;

/// Outbound channel for visitor messages.
#[async_trait]
pub trait ContactMailer: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> Result<(), ContactError>;
}
