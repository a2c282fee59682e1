use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A message from a site visitor.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    /// Every failing field, in form order. Empty when the message can be sent.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Name is required"));
        }

        if self.email.trim().is_empty() {
            errors.push(ValidationError::new("email", "Email is required"));
        } else if !looks_like_email(&self.email) {
            errors.push(ValidationError::new("email", "Email is invalid"));
        }

        if self.message.trim().is_empty() {
            errors.push(ValidationError::new("message", "Message is required"));
        }

        errors
    }

    /// Subject line for the outgoing mail.
    pub fn subject_line(&self) -> String {
        match self.subject.as_deref().map(str::trim) {
            Some(subject) if !subject.is_empty() => subject.to_string(),
            _ => format!("Portfolio enquiry from {}", self.name.trim()),
        }
    }
}

/// Loose address check: somewhere in the input there is a run of non-space
/// characters shaped like `a@b.c`.
pub fn looks_like_email(input: &str) -> bool {
    input.split_whitespace().any(|token| {
        let chars: Vec<char> = token.chars().collect();
        let len = chars.len();
        chars
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, c)| **c == '@')
            .any(|(at, _)| (at + 2..len.saturating_sub(1)).any(|dot| chars[dot] == '.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: None,
            message: "Is the harbour series available?".to_string(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("ada@example.com"));
        assert!(looks_like_email("a@b.c"));
        assert!(looks_like_email("  ada@mail.example.org "));
        assert!(!looks_like_email("ada@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada@.com"));
        assert!(!looks_like_email("ada@example."));
        assert!(!looks_like_email("ada @example.com"));
        assert!(!looks_like_email(""));
    }

    #[test]
    fn valid_message_has_no_errors() {
        assert!(message().validate().is_empty());
    }

    #[test]
    fn reports_every_failing_field() {
        let msg = ContactMessage {
            name: "  ".to_string(),
            email: "not-an-address".to_string(),
            subject: Some("Hi".to_string()),
            message: String::new(),
        };
        let fields: Vec<&str> = msg.validate().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "message"]);
    }

    #[test]
    fn blank_subject_falls_back_to_sender() {
        let mut msg = message();
        assert_eq!(msg.subject_line(), "Portfolio enquiry from Ada");
        msg.subject = Some("  ".to_string());
        assert_eq!(msg.subject_line(), "Portfolio enquiry from Ada");
        msg.subject = Some("Commission".to_string());
        assert_eq!(msg.subject_line(), "Commission");
    }
}
