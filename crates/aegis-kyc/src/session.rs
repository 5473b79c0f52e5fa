//! Client-held login state.
//!
//! A signed-in user is kept as one serialized [`Session`] in a [`SessionStorage`] slot and
//! cleared on sign-out. Storage and clock are injected so the state can live in a browser
//! bridge, a file, or memory.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::Clock;
use crate::identity::{Role, User, UserId};

/// Header carrying the acting user's id on wizard and review routes.
pub const ACTOR_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    /// Landing page after sign-in.
    pub fn home_path(&self) -> &'static str {
        match self.user.role {
            Role::Admin => "/admin",
            Role::User => "/dashboard",
        }
    }

    /// Header pair identifying this session's user to the API.
    pub fn actor_header(&self) -> (&'static str, String) {
        (ACTOR_HEADER, self.user.id.to_string())
    }
}

/// Single-slot raw storage for the serialized session.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn store(&self, raw: String) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemorySessionStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySessionStorage {
    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, SessionError> {
        self.slot
            .lock()
            .map_err(|_| SessionError::Storage("session slot lock poisoned".to_string()))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.slot()?.clone())
    }

    fn store(&self, raw: String) -> Result<(), SessionError> {
        *self.slot()? = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot()? = None;
        Ok(())
    }
}

pub struct SessionManager<S> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S> SessionManager<S>
where
    S: SessionStorage,
{
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn sign_in(&self, user: User) -> Result<Session, SessionError> {
        let session = Session {
            user,
            signed_in_at: self.clock.now(),
        };
        let raw = serde_json::to_string(&session)?;
        self.storage.store(raw)?;
        Ok(session)
    }

    /// The stored session. A slot that no longer parses is cleared and treated as signed out.
    pub fn current(&self) -> Result<Option<Session>, SessionError> {
        let Some(raw) = self.storage.load()? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!(error = %err, "discarding unreadable session");
                self.storage.clear()?;
                Ok(None)
            }
        }
    }

    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.storage.clear()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session storage failed: {0}")]
    Storage(String),
    #[error("session could not be serialized: {0}")]
    Encode(#[from] serde_json::Error),
}
