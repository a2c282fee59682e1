use super::mailer::ContactMailer;
use super::model::ContactMessage;
use crate::error::ContactError;

/// Hand a visitor message to the mailer. Validation is the caller's job.
pub async fn deliver_contact(
    mailer: &dyn ContactMailer,
    message: ContactMessage,
) -> Result<(), ContactError> {
    mailer.send(&message).await?;
    tracing::info!(from = %message.email, "contact message delivered");
    Ok(())
}
