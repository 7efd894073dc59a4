//! Listener slots for session events

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::TokenPair;

/// Called after every successful refresh with the new pair
pub type TokenRefreshListener = Arc<dyn Fn(&TokenPair) + Send + Sync>;

/// Called when the session cannot be restored
pub type AuthErrorListener = Arc<dyn Fn() + Send + Sync>;

/// One slot per event. Registering replaces the previous listener.
///
/// Listeners are cloned out of their slot before being called, so a
/// listener may re-register or read client state without deadlocking.
#[derive(Default)]
pub(crate) struct Hooks {
    token_refresh: RwLock<Option<TokenRefreshListener>>,
    auth_error: RwLock<Option<AuthErrorListener>>,
}

impl Hooks {
    pub fn set_token_refresh(&self, listener: TokenRefreshListener) {
        *self
            .token_refresh
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    pub fn set_auth_error(&self, listener: AuthErrorListener) {
        *self.auth_error.write().unwrap_or_else(PoisonError::into_inner) = Some(listener);
    }

    pub fn token_refreshed(&self, pair: &TokenPair) {
        let listener = self
            .token_refresh
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener(pair);
        }
    }

    pub fn auth_failed(&self) {
        let listener = self
            .auth_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener();
        }
    }

    pub fn clear(&self) {
        *self
            .token_refresh
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        *self.auth_error.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
