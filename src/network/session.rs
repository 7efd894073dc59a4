//! Credential state shared by every call on a client

use std::sync::{PoisonError, RwLock};

use crate::models::{Credentials, TokenPair};

/// Snapshot of the held credentials together with the generation they
/// belong to.
#[derive(Clone, Debug, Default)]
pub(crate) struct SessionSnapshot {
    pub credentials: Credentials,
    pub generation: u64,
}

/// The current token pair. Both tokens are swapped under one lock so a
/// reader never sees an access token paired with the wrong refresh token.
///
/// The generation increases on every replacement and lets a caller tell
/// whether the pair it acted on is still current.
#[derive(Debug, Default)]
pub(crate) struct Session {
    state: RwLock<SessionSnapshot>,
}

impl Session {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn credentials(&self) -> Credentials {
        self.snapshot().credentials
    }

    /// Replace the whole pair, returning the new generation
    pub fn replace(&self, credentials: Credentials) -> u64 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.credentials = credentials;
        state.generation += 1;
        state.generation
    }

    pub fn rotate(&self, pair: &TokenPair) -> u64 {
        self.replace(Credentials::from(pair.clone()))
    }

    /// Rotate only if the pair is still the one seen at `expected`.
    /// Returns `None` when it was replaced in the meantime.
    pub fn rotate_if_current(&self, expected: u64, pair: &TokenPair) -> Option<u64> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.generation != expected {
            return None;
        }
        state.credentials = Credentials::from(pair.clone());
        state.generation += 1;
        Some(state.generation)
    }

    pub fn clear(&self) -> u64 {
        self.replace(Credentials::default())
    }
}
