use anyhow::Result;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::models::User;

use super::token::TokenStore;

/// Holds the authenticated identity for the process.
///
/// There is exactly one instance, owned by the auth flow; views read it
/// and only the flow mutates it. `is_loading` is true from construction
/// until the first `bootstrap` attempt resolves, and consumers must not
/// treat the identity as settled while it is.
pub struct SessionStore {
    identity: Option<User>,
    is_loading: bool,
    bootstrapped: bool,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            identity: None,
            is_loading: true,
            bootstrapped: false,
        }
    }

    /// Attempt to rehydrate the session from a persisted token.
    ///
    /// Runs at most once per process lifetime; later calls are no-ops so
    /// repeated view mounts cannot trigger duplicate session fetches.
    /// With no stored token this resolves to anonymous without touching
    /// the network. A stored but rejected token is cleared silently; the
    /// user just starts anonymous.
    pub async fn bootstrap(
        &mut self,
        client: &mut ApiClient,
        tokens: &dyn TokenStore,
    ) -> Result<()> {
        if self.bootstrapped {
            return Ok(());
        }
        self.bootstrapped = true;

        let result = async {
            let Some(token) = tokens.load()? else {
                debug!("No stored access token, starting anonymous");
                return Ok(());
            };

            client.set_token(token);
            match client.fetch_session().await {
                Ok(user) => {
                    info!(user = %user.display_name(), "Session rehydrated");
                    self.identity = Some(user);
                }
                Err(e) => {
                    debug!(error = %e, "Stored token rejected, clearing");
                    client.clear_token();
                    tokens.clear()?;
                }
            }
            Ok(())
        }
        .await;

        // The loading flag clears no matter how the attempt ended
        self.is_loading = false;
        result
    }

    pub fn set_identity(&mut self, identity: Option<User>) {
        self.identity = identity;
    }

    /// Drop the identity; used on sign-out
    pub fn reset(&mut self) {
        self.identity = None;
    }

    pub fn identity(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
