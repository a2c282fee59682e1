use async_trait::async_trait;
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;

use folio_atoms::contact::{ContactMailer, ContactMessage};
use folio_atoms::error::ContactError;

/// Delivers contact messages to the studio inbox through SES.
pub struct SesMailer {
    client: SesClient,
    to_email: String,
    from_email: String,
}

impl SesMailer {
    pub fn new(client: SesClient, to_email: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            client,
            to_email: to_email.into(),
            from_email: from_email.into(),
        }
    }
}

/// Plain-text body of the mail the studio receives.
pub fn render_contact_email(message: &ContactMessage) -> String {
    let mut text = format!(
        "New message from the portfolio contact form\n\nName: {}\nEmail: {}\n",
        message.name.trim(),
        message.email.trim()
    );
    if let Some(subject) = message.subject.as_deref().filter(|s| !s.trim().is_empty()) {
        text.push_str(&format!("Subject: {}\n", subject.trim()));
    }
    text.push('\n');
    text.push_str(message.message.trim());
    text.push('\n');
    text
}

fn utf8(data: String) -> Result<Content, ContactError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| ContactError::Delivery(format!("invalid email content: {}", e)))
}

#[async_trait]
impl ContactMailer for SesMailer {
    async fn send(&self, message: &ContactMessage) -> Result<(), ContactError> {
        let body = Body::builder()
            .text(utf8(render_contact_email(message))?)
            .build();
        let mail = Message::builder()
            .subject(utf8(message.subject_line())?)
            .body(body)
            .build();

        self.client
            .send_email()
            .from_email_address(&self.from_email)
            .destination(Destination::builder().to_addresses(&self.to_email).build())
            .reply_to_addresses(message.email.trim())
            .content(EmailContent::builder().simple(mail).build())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("SES send_email failed: {}", DisplayErrorContext(&e));
                ContactError::Delivery(DisplayErrorContext(&e).to_string())
            })?;

        Ok(())
    }
}
