//! Authentication state for one client instance.
//!
//! The session starts in [`SessionPhase::Restoring`] and settles after
//! [`Session::restore`]. It is the only writer of the persisted token.

use std::sync::Arc;

use agency_api::{decode_token_claims, Identity};
use time::OffsetDateTime;
use token_store::TokenStore;
use tracing::{info, warn};

use crate::error::DeskError;
use crate::gateway::AuthGateway;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub identity: Identity,
    /// False when the identity was built locally because `/users/me` failed
    /// right after login.
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Restoring,
    Unauthenticated,
    Authenticated(AuthenticatedUser),
}

/// Where the view should go after a session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Home,
    Login,
}

pub struct Session {
    auth: Arc<dyn AuthGateway>,
    store: Arc<dyn TokenStore>,
    phase: SessionPhase,
}

impl Session {
    pub fn new(auth: Arc<dyn AuthGateway>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            auth,
            store,
            phase: SessionPhase::Restoring,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match &self.phase {
            SessionPhase::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.user().map(|user| &user.identity)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Resume from a persisted token. Never fails: anything unusable leaves
    /// the session unauthenticated.
    pub async fn restore(&mut self) -> &SessionPhase {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(error) => {
                warn!(error = %error, "failed to read stored token");
                None
            }
        };
        let Some(stored) = stored else {
            self.phase = SessionPhase::Unauthenticated;
            return &self.phase;
        };

        let now = OffsetDateTime::now_utc().unix_timestamp();
        if decode_token_claims(&stored.token).is_some_and(|claims| claims.is_expired_at(now)) {
            info!("stored token expired; signing out");
            self.discard_token();
            self.phase = SessionPhase::Unauthenticated;
            return &self.phase;
        }

        match self.auth.users_me(Some(&stored.token)).await {
            Ok(identity) => {
                info!(email = %identity.email, "session restored");
                self.phase = SessionPhase::Authenticated(AuthenticatedUser {
                    identity,
                    verified: true,
                });
            }
            Err(error) => {
                warn!(error = %error, "stored token rejected");
                self.discard_token();
                self.phase = SessionPhase::Unauthenticated;
            }
        }
        &self.phase
    }

    /// Exchange credentials for a token and resolve the account behind it.
    ///
    /// Only the credential exchange can fail. A failed identity lookup still
    /// signs in, with an unverified identity built from `username`.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Navigation, DeskError> {
        let access = self.auth.login_access_token(username, password).await?;

        if let Err(error) = self.store.save(&access.access_token) {
            warn!(error = %error, "failed to persist access token");
        }

        let user = match self.auth.users_me(Some(&access.access_token)).await {
            Ok(identity) => AuthenticatedUser {
                identity,
                verified: true,
            },
            Err(error) => {
                warn!(error = %error, "identity lookup failed after login");
                AuthenticatedUser {
                    identity: placeholder_identity(username),
                    verified: false,
                }
            }
        };

        info!(email = %user.identity.email, verified = user.verified, "signed in");
        self.phase = SessionPhase::Authenticated(user);
        Ok(Navigation::Home)
    }

    /// Forget the token. Safe to call in any phase.
    pub fn logout(&mut self) -> Navigation {
        self.discard_token();
        if self.is_authenticated() {
            info!("signed out");
        }
        self.phase = SessionPhase::Unauthenticated;
        Navigation::Login
    }

    fn discard_token(&self) {
        if let Err(error) = self.store.clear() {
            warn!(error = %error, "failed to remove stored token");
        }
    }
}

fn placeholder_identity(username: &str) -> Identity {
    Identity {
        id: 1,
        email: username.to_owned(),
        is_active: true,
        is_superuser: false,
    }
}
