use anyhow::{anyhow, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::User;

use super::session::SessionStore;
use super::token::TokenStore;

/// TOTP provisioning issuer shown in authenticator apps
const TOTP_ISSUER: &str = "AgentPlatform";

/// Authentication lifecycle states.
///
/// `TwoFactorPending` is entered from `Authenticating` when the backend
/// answers a sign-in with `requires2FA` instead of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    TwoFactorPending,
    Authenticated,
}

/// Result of a sign-in attempt that did not fail outright.
#[derive(Debug)]
pub enum SignInOutcome {
    /// Token stored, identity set.
    Authenticated(User),
    /// The account requires a TOTP code; no token has been stored. The
    /// partial identity is returned for display only. Complete with
    /// [`AuthFlow::complete_two_factor_sign_in`].
    TwoFactorRequired(User),
}

/// Credential context retained while a sign-in waits on its second
/// factor. Discarded on completion, cancellation, or sign-out.
struct PendingSignIn {
    email: String,
    password: String,
}

/// Errors from 2FA code verification. `InvalidCode` is retryable with a
/// fresh code; `SecretExpired` ends the enrollment attempt.
#[derive(Error, Debug)]
pub enum TwoFactorError {
    #[error("invalid code: {0}")]
    InvalidCode(String),

    #[error("enrollment secret expired - restart 2FA setup")]
    SecretExpired,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Orchestrates login, registration, logout, password reset, and 2FA
/// enrollment against the backend, updating the session store and token
/// storage as the single owner of both.
///
/// Methods take `&mut self`, so overlapping submissions are serialized
/// by the borrow rules; the form layer additionally disables its submit
/// path while a call is in flight.
pub struct AuthFlow {
    client: ApiClient,
    tokens: Box<dyn TokenStore>,
    session: SessionStore,
    state: AuthState,
    pending: Option<PendingSignIn>,
    /// Enrollment secret cached for the lifetime of one setup attempt,
    /// so repeated fetches cannot mint competing secrets server-side.
    enrollment_secret: Option<String>,
}

impl AuthFlow {
    pub fn new(client: ApiClient, tokens: Box<dyn TokenStore>) -> Self {
        Self {
            client,
            tokens,
            session: SessionStore::new(),
            state: AuthState::Anonymous,
            pending: None,
            enrollment_secret: None,
        }
    }

    /// One-time startup rehydration from the persisted token.
    /// See [`SessionStore::bootstrap`] for the exact contract.
    pub async fn bootstrap(&mut self) -> Result<()> {
        let result = self
            .session
            .bootstrap(&mut self.client, self.tokens.as_ref())
            .await;
        if self.session.is_authenticated() {
            self.state = AuthState::Authenticated;
        }
        result
    }

    /// Submit a credential for authentication.
    ///
    /// Outright acceptance stores the token and sets the identity. A
    /// `requires2FA` answer parks the credential context and reports
    /// `TwoFactorRequired` without storing anything. Rejection leaves
    /// the flow anonymous with the server's message; there is no
    /// automatic retry.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<SignInOutcome> {
        self.state = AuthState::Authenticating;

        let response = match self.client.login(email, password, None).await {
            Ok(response) => response,
            Err(e) => {
                self.state = AuthState::Anonymous;
                return Err(e);
            }
        };

        if response.requires_two_factor {
            debug!("Sign-in requires second factor");
            self.pending = Some(PendingSignIn {
                email: email.to_string(),
                password: password.to_string(),
            });
            self.state = AuthState::TwoFactorPending;
            return Ok(SignInOutcome::TwoFactorRequired(response.user));
        }

        let Some(token) = response.access_token else {
            self.state = AuthState::Anonymous;
            return Err(anyhow!(ApiError::InvalidResponse(
                "login response carried neither a token nor a 2FA challenge".to_string()
            )));
        };

        self.establish_session(token, response.user.clone())?;
        info!(user = %response.user.display_name(), "Signed in");
        Ok(SignInOutcome::Authenticated(response.user))
    }

    /// Finish a 2FA-gated sign-in by re-submitting the pending
    /// credential together with the TOTP code.
    ///
    /// An invalid code leaves the pending context in place so the user
    /// can retry with the next code from their authenticator.
    pub async fn complete_two_factor_sign_in(&mut self, code: &str) -> Result<User> {
        let Some(pending) = self.pending.as_ref() else {
            return Err(anyhow!("no sign-in is waiting on a second factor"));
        };

        let response = self
            .client
            .login(&pending.email, &pending.password, Some(code))
            .await?;

        let Some(token) = response.access_token else {
            return Err(anyhow!(ApiError::InvalidResponse(
                "2FA login response carried no token".to_string()
            )));
        };

        self.pending = None;
        self.establish_session(token, response.user.clone())?;
        info!(user = %response.user.display_name(), "Signed in with second factor");
        Ok(response.user)
    }

    /// Register a new account. Does not authenticate: the caller prompts
    /// the user to sign in, or to continue into optional 2FA enrollment.
    pub async fn sign_up(&mut self, username: &str, email: &str, password: &str) -> Result<User> {
        let user = self.client.register(username, email, password).await?;
        info!(user = %user.display_name(), "Registered");
        Ok(user)
    }

    /// Sign out. Local state (token, identity, pending 2FA context) is
    /// cleared unconditionally before the server is told; a failed
    /// remote logout is reported but never undoes the local reset.
    pub async fn sign_out(&mut self) -> Result<()> {
        let remote = self.client.clone();

        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to remove stored access token");
        }
        self.client.clear_token();
        self.session.reset();
        self.pending = None;
        self.enrollment_secret = None;
        self.state = AuthState::Anonymous;
        info!("Signed out locally");

        remote.logout().await
    }

    /// Fire-and-forget password reset request. Returns the confirmation
    /// message; authentication state is unchanged.
    pub async fn reset_password(&self, email: &str) -> Result<String> {
        self.client.reset_password(email).await
    }

    /// Fetch the TOTP enrollment secret.
    ///
    /// At most one secret is minted per enrollment attempt: a repeat
    /// call returns the cached secret instead of asking the server for
    /// another one.
    pub async fn get_2fa_secret(&mut self) -> Result<String> {
        if let Some(secret) = &self.enrollment_secret {
            return Ok(secret.clone());
        }
        let secret = self.client.generate_2fa_secret().await?;
        self.enrollment_secret = Some(secret.clone());
        Ok(secret)
    }

    /// Verify a TOTP code against the cached enrollment secret and turn
    /// 2FA on for the account.
    pub async fn enable_2fa(&mut self, code: &str) -> Result<(), TwoFactorError> {
        let Some(secret) = self.enrollment_secret.clone() else {
            return Err(TwoFactorError::Other(anyhow!(
                "no 2FA enrollment in progress - fetch a secret first"
            )));
        };

        match self.client.enable_2fa(code, &secret).await {
            Ok(()) => {
                self.enrollment_secret = None;
                if let Some(user) = self.session.identity() {
                    let mut user = user.clone();
                    user.totp_enabled = true;
                    self.session.set_identity(Some(user));
                }
                info!("Two-factor authentication enabled");
                Ok(())
            }
            Err(e) => {
                match e.downcast_ref::<ApiError>() {
                    Some(ApiError::Rejected(message)) => {
                        // Wrong code; the secret is still good, let them retry
                        return Err(TwoFactorError::InvalidCode(message.clone()));
                    }
                    Some(ApiError::NotFound(_)) => {
                        self.enrollment_secret = None;
                        return Err(TwoFactorError::SecretExpired);
                    }
                    _ => {}
                }
                Err(TwoFactorError::Other(e))
            }
        }
    }

    /// Abandon any pending 2FA sign-in and enrollment state. Called when
    /// the auth view toggles between login and registration modes or
    /// closes the 2FA setup screen.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
        self.enrollment_secret = None;
        if self.state == AuthState::TwoFactorPending || self.state == AuthState::Authenticating {
            self.state = if self.session.is_authenticated() {
                AuthState::Authenticated
            } else {
                AuthState::Anonymous
            };
        }
    }

    /// otpauth:// URI for loading the enrollment secret into an
    /// authenticator app (rendered as a QR code by graphical clients).
    /// The account label is percent-encoded; the secret is base32 and
    /// passes through unchanged.
    pub fn provisioning_uri(secret: &str, account: &str) -> String {
        format!(
            "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}",
            issuer = TOTP_ISSUER,
            account = urlencoding::encode(account),
        )
    }

    fn establish_session(&mut self, token: String, user: User) -> Result<()> {
        self.tokens.store(&token)?;
        self.client.set_token(token);
        self.session.set_identity(Some(user));
        self.state = AuthState::Authenticated;
        Ok(())
    }

    // ===== Accessors =====

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn identity(&self) -> Option<&User> {
        self.session.identity()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Client carrying the current token, for resource endpoint calls
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::MemoryTokenStore;

    fn test_flow() -> AuthFlow {
        let client = ApiClient::new("http://localhost:0").unwrap();
        AuthFlow::new(client, Box::new(MemoryTokenStore::new()))
    }

    #[test]
    fn test_new_flow_is_anonymous() {
        let flow = test_flow();
        assert_eq!(flow.state(), AuthState::Anonymous);
        assert!(!flow.is_authenticated());
        assert!(flow.session().is_loading());
    }

    #[test]
    fn test_cancel_pending_returns_to_anonymous() {
        let mut flow = test_flow();
        flow.state = AuthState::TwoFactorPending;
        flow.pending = Some(PendingSignIn {
            email: "a@b.com".into(),
            password: "pw".into(),
        });
        flow.enrollment_secret = Some("SECRET".into());

        flow.cancel_pending();
        assert_eq!(flow.state(), AuthState::Anonymous);
        assert!(flow.pending.is_none());
        assert!(flow.enrollment_secret.is_none());
    }

    #[test]
    fn test_provisioning_uri_format() {
        let uri = AuthFlow::provisioning_uri("JBSWY3DP", "a@b.com");
        assert_eq!(
            uri,
            "otpauth://totp/AgentPlatform:a%40b.com?secret=JBSWY3DP&issuer=AgentPlatform"
        );
    }

    #[test]
    fn test_provisioning_uri_escapes_reserved_characters() {
        let uri = AuthFlow::provisioning_uri("JBSWY3DP", "a b?c#d@e.com");
        assert!(uri.starts_with("otpauth://totp/AgentPlatform:a%20b%3Fc%23d%40e.com?"));
        // The query component stays intact
        assert!(uri.ends_with("?secret=JBSWY3DP&issuer=AgentPlatform"));
    }
}
