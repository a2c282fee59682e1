use std::collections::BTreeMap;

use folio_atoms::contact::{self, ContactMailer, ContactMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
}

impl ContactField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(ContactField::Name),
            "email" => Some(ContactField::Email),
            "subject" => Some(ContactField::Subject),
            "message" => Some(ContactField::Message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Success,
    Error,
}

/// The public contact form.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    name: String,
    email: String,
    subject: String,
    message: String,
    errors: BTreeMap<ContactField, String>,
    submitting: bool,
    status: Option<SubmitStatus>,
}

impl ContactForm {
    /// Edit a field. Any error shown for that field goes away.
    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ContactField::Name => self.name = value,
            ContactField::Email => self.email = value,
            ContactField::Subject => self.subject = value,
            ContactField::Message => self.message = value,
        }
        self.errors.remove(&field);
    }

    pub fn value(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Subject => &self.subject,
            ContactField::Message => &self.message,
        }
    }

    pub fn error(&self, field: ContactField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn status(&self) -> Option<SubmitStatus> {
        self.status
    }

    pub fn to_message(&self) -> ContactMessage {
        let subject = self.subject.trim();
        ContactMessage {
            name: self.name.clone(),
            email: self.email.clone(),
            subject: (!subject.is_empty()).then(|| subject.to_string()),
            message: self.message.clone(),
        }
    }

    /// Replace the error set with the current failures. True when clean.
    pub fn validate(&mut self) -> bool {
        self.errors = self
            .to_message()
            .validate()
            .into_iter()
            .filter_map(|e| ContactField::from_name(e.field).map(|field| (field, e.message)))
            .collect();
        self.errors.is_empty()
    }

    /// Validate and send. Nothing is sent while any field is invalid; a
    /// successful send clears the form.
    pub async fn submit(&mut self, mailer: &dyn ContactMailer) -> bool {
        if !self.validate() {
            return false;
        }

        self.submitting = true;
        self.status = None;

        let result = contact::deliver_contact(mailer, self.to_message()).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                self.name.clear();
                self.email.clear();
                self.subject.clear();
                self.message.clear();
                self.status = Some(SubmitStatus::Success);
                true
            }
            Err(e) => {
                tracing::error!("contact submit failed: {}", e);
                self.status = Some(SubmitStatus::Error);
                false
            }
        }
    }
}
