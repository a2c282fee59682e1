use folio_atoms::session::SessionContext;

/// Admin sign-in form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    error: Option<String>,
}

impl LoginForm {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True once the session context holds the new session.
    pub async fn submit(&mut self, session: &SessionContext) -> bool {
        self.error = None;

        if self.email.trim().is_empty() || self.password.is_empty() {
            self.error = Some("Please enter both email and password".to_string());
            return false;
        }

        match session.login(self.email.trim(), &self.password).await {
            Ok(_) => true,
            Err(_) => {
                self.error = Some("Invalid email or password".to_string());
                false
            }
        }
    }
}
