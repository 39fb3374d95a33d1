use std::sync::Arc;

use thiserror::Error;

use crate::fixtures::{FixtureError, FixtureRepository};
use crate::identity::Identity;
use crate::session::{Session, SessionError, SessionStore};

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("session id must not be empty")]
    EmptySessionId,

    #[error("no fixture data is provisioned for identity '{0}'")]
    UnknownIdentity(Identity),

    #[error(transparent)]
    SessionAlreadyBound(#[from] SessionError),

    #[error("fixture storage failure: {0}")]
    Storage(#[from] FixtureError),
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    /// False when the session was already bound to this identity.
    pub newly_authenticated: bool,
}

/// Validates login submissions against the provisioned identity space and
/// marks sessions as authenticated.
#[derive(Clone)]
pub struct AuthGateway {
    sessions: SessionStore,
    fixtures: Arc<dyn FixtureRepository>,
}

impl AuthGateway {
    pub fn new(sessions: SessionStore, fixtures: Arc<dyn FixtureRepository>) -> Self {
        Self { sessions, fixtures }
    }

    pub async fn login(
        &self,
        session_id: &str,
        identity: &Identity,
    ) -> Result<LoginOutcome, LoginError> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(LoginError::EmptySessionId);
        }

        if !self.fixtures.has_identity(identity).await? {
            tracing::info!(session_id, identity = %identity, "login rejected: unknown identity");
            return Err(LoginError::UnknownIdentity(identity.clone()));
        }

        let (session, newly_authenticated) = self.sessions.authenticate(session_id, identity)?;
        tracing::info!(session_id, identity = %identity, newly_authenticated, "login succeeded");

        Ok(LoginOutcome {
            session,
            newly_authenticated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::InMemoryFixtures;
    use crate::tools::Tool;

    fn gateway() -> (AuthGateway, SessionStore) {
        let sessions = SessionStore::new();
        let fixtures = InMemoryFixtures::new()
            .with_document("1010101010", Tool::FetchNetWorth, "{}")
            .with_identity("2020202020");
        (
            AuthGateway::new(sessions.clone(), Arc::new(fixtures)),
            sessions,
        )
    }

    #[tokio::test]
    async fn login_with_known_identity_authenticates() {
        let (gateway, sessions) = gateway();
        sessions.get_or_create("s1");

        let outcome = gateway
            .login("s1", &Identity::new("1010101010"))
            .await
            .expect("login");

        assert!(outcome.newly_authenticated);
        assert_eq!(
            outcome.session.bound_identity(),
            Some(&Identity::new("1010101010"))
        );
        assert!(sessions.is_authenticated("s1").0);
    }

    #[tokio::test]
    async fn unknown_identity_leaves_session_pending() {
        let (gateway, sessions) = gateway();
        sessions.get_or_create("s1");

        let err = gateway
            .login("s1", &Identity::new("5555555555"))
            .await
            .expect_err("unknown identity");

        assert!(matches!(err, LoginError::UnknownIdentity(_)));
        assert_eq!(sessions.is_authenticated("s1"), (false, None));
    }

    #[tokio::test]
    async fn empty_session_id_is_rejected_before_lookup() {
        let (gateway, sessions) = gateway();
        let err = gateway
            .login("   ", &Identity::new("1010101010"))
            .await
            .expect_err("empty session");
        assert!(matches!(err, LoginError::EmptySessionId));
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn repeat_login_is_idempotent() {
        let (gateway, sessions) = gateway();
        let identity = Identity::new("1010101010");

        gateway.login("s1", &identity).await.expect("first");
        let second = gateway.login("s1", &identity).await.expect("second");

        assert!(!second.newly_authenticated);
        assert_eq!(sessions.is_authenticated("s1"), (true, Some(identity)));
    }

    #[tokio::test]
    async fn rebinding_to_another_identity_fails() {
        let (gateway, sessions) = gateway();
        gateway
            .login("s1", &Identity::new("1010101010"))
            .await
            .expect("first");

        let err = gateway
            .login("s1", &Identity::new("2020202020"))
            .await
            .expect_err("rebind");

        assert!(matches!(err, LoginError::SessionAlreadyBound(_)));
        assert_eq!(
            sessions.is_authenticated("s1").1,
            Some(Identity::new("1010101010"))
        );
    }
}
