//! Auth screen form controller.
//!
//! Pure input collection and validation for the login/registration
//! screen. Nothing here talks to the backend: a successful validation
//! hands a `Submission` to the auth flow, and a failed one blocks the
//! submission before any network call happens.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Login,
    Register,
}

/// Validated form output, ready to hand to the auth flow.
#[derive(Debug, PartialEq, Eq)]
pub enum Submission {
    Login {
        email: String,
        password: String,
    },
    Register {
        username: String,
        email: String,
        password: String,
    },
}

#[derive(Debug)]
pub struct AuthForm {
    mode: FormMode,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    error: Option<String>,
    submitting: bool,
}

impl AuthForm {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Login,
            email: String::new(),
            username: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            error: None,
            submitting: false,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Switch between login and registration.
    ///
    /// Clears any displayed error and the entered passwords. The caller
    /// must also discard pending 2FA state on the flow
    /// (`AuthFlow::cancel_pending`); the form cannot reach it.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            FormMode::Login => FormMode::Register,
            FormMode::Register => FormMode::Login,
        };
        self.error = None;
        self.clear_credentials();
    }

    /// Validate the current fields for the current mode.
    ///
    /// On failure the error is recorded for display and returned; the
    /// form fields are left untouched so the user can correct them.
    pub fn validate(&mut self) -> Result<Submission, String> {
        let result = self.validate_inner();
        if let Err(ref message) = result {
            self.error = Some(message.clone());
        }
        result
    }

    fn validate_inner(&self) -> Result<Submission, String> {
        if self.email.trim().is_empty() {
            return Err("Email is required".to_string());
        }
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }

        match self.mode {
            FormMode::Login => Ok(Submission::Login {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            }),
            FormMode::Register => {
                if self.username.trim().is_empty() {
                    return Err("Username is required".to_string());
                }
                // Bit-for-bit match; no trimming on either side
                if self.password != self.confirm_password {
                    return Err("Passwords do not match".to_string());
                }
                Ok(Submission::Register {
                    username: self.username.trim().to_string(),
                    email: self.email.trim().to_string(),
                    password: self.password.clone(),
                })
            }
        }
    }

    /// Mark a submission as started. Returns false if one is already in
    /// flight, so the caller can disable its submit path and a double
    /// press cannot race two requests.
    pub fn begin_submit(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        self.submitting = true;
        self.error = None;
        true
    }

    /// Mark the in-flight submission as resolved, success or failure.
    /// The entered passwords are discarded either way.
    pub fn finish_submit(&mut self) {
        self.submitting = false;
        self.clear_credentials();
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Record a flow-level error (server rejection, transport failure)
    /// for form-level display.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Passwords never outlive a submission attempt
    fn clear_credentials(&mut self) {
        self.password.clear();
        self.confirm_password.clear();
    }
}

impl Default for AuthForm {
    fn default() -> Self {
        Self::new()
    }
}
