//! Authentication module for managing the session lifecycle.
//!
//! This module provides:
//! - `TokenStore`: durable access-token storage (OS keychain by default)
//! - `SessionStore`: the single owner of the authenticated identity
//! - `AuthFlow`: sign-in/sign-up/sign-out and 2FA orchestration
//! - `AuthForm`: auth screen input validation
//!
//! The token is an opaque JWT issued by the backend; the client never
//! inspects it, only attaches it as a bearer credential.

pub mod flow;
pub mod form;
pub mod session;
pub mod token;

pub use flow::{AuthFlow, AuthState, SignInOutcome, TwoFactorError};
pub use form::{AuthForm, FormMode, Submission};
pub use session::SessionStore;
pub use token::{KeyringTokenStore, MemoryTokenStore, TokenStore};
