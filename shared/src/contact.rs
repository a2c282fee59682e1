use lambda_http::{http::StatusCode, Body, Error, Response};

use folio_atoms::contact::{deliver_contact, ContactMailer, ContactMessage};
use folio_atoms::respond;

/// Handle contact form submission
pub async fn handle_contact(mailer: &dyn ContactMailer, body: &[u8]) -> Result<Response<Body>, Error> {
    tracing::info!("Contact form submission received");

    let message: ContactMessage = match respond::parse_body(body) {
        Ok(message) => message,
        Err(resp) => return Ok(resp),
    };

    let errors = message.validate();
    if !errors.is_empty() {
        let fields: serde_json::Map<String, serde_json::Value> = errors
            .iter()
            .map(|e| (e.field.to_string(), serde_json::Value::from(e.message.clone())))
            .collect();
        return respond::json(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({ "error": errors[0].message, "fields": fields }),
        );
    }

    match deliver_contact(mailer, message).await {
        Ok(()) => respond::json(
            StatusCode::OK,
            &serde_json::json!({ "message": "Message sent successfully" }),
        ),
        Err(e) => {
            tracing::error!("Failed to send contact email: {}", e);
            respond::error(
                e.status_code(),
                "Failed to send message. Please try again later.",
            )
        }
    }
}
