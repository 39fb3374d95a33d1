use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::identity::Identity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session '{session_id}' is already bound to identity '{bound}'")]
    SessionAlreadyBound {
        session_id: String,
        bound: Identity,
        requested: Identity,
    },
}

/// Authentication state of a session. A bound identity exists exactly when
/// the session is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Authenticated {
        identity: Identity,
        authenticated_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
}

impl Session {
    fn pending(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: SessionState::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn bound_identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Authenticated { identity, .. } => Some(identity),
            SessionState::Pending => None,
        }
    }
}

/// Process-wide registry of sessions. Sessions are never expired or removed;
/// they live as long as the store.
///
/// All mutation happens under one exclusive region, so a login that returns
/// is visible to every later read of the same id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `session_id`, creating an unauthenticated one
    /// if the id has not been seen. Racing callers observe a single record.
    pub fn get_or_create(&self, session_id: &str) -> Session {
        if let Some(existing) = self.get(session_id) {
            return existing;
        }

        let mut map = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        map.entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id, "session created");
                Session::pending(session_id)
            })
            .clone()
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        let map = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        map.get(session_id).cloned()
    }

    /// Binds `identity` to the session, creating the record if needed.
    ///
    /// Repeating the call with the bound identity is a no-op; a different
    /// identity is rejected and the existing binding is kept. The flag is
    /// true only for the call that performed the transition.
    pub fn authenticate(
        &self,
        session_id: &str,
        identity: &Identity,
    ) -> Result<(Session, bool), SessionError> {
        let mut map = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let session = map
            .entry(session_id.to_string())
            .or_insert_with(|| Session::pending(session_id));

        if let SessionState::Authenticated { identity: bound, .. } = &session.state {
            if bound != identity {
                return Err(SessionError::SessionAlreadyBound {
                    session_id: session_id.to_string(),
                    bound: bound.clone(),
                    requested: identity.clone(),
                });
            }
            return Ok((session.clone(), false));
        }

        session.state = SessionState::Authenticated {
            identity: identity.clone(),
            authenticated_at: Utc::now(),
        };
        Ok((session.clone(), true))
    }

    /// Authentication status and bound identity. Unknown ids are reported as
    /// unauthenticated without creating a record.
    pub fn is_authenticated(&self, session_id: &str) -> (bool, Option<Identity>) {
        match self.get(session_id).and_then(|s| s.bound_identity().cloned()) {
            Some(identity) => (true, Some(identity)),
            None => (false, None),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
