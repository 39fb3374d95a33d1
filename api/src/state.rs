use std::sync::Arc;

use finmock_core::{AuthGateway, FixtureRepository, SessionStore, ToolDispatcher};
use finmock_mcp_runtime::McpEndpoint;
use url::Url;

/// Everything the handlers share. The session store is created once here and
/// handed to both the protocol endpoint and the login gateway.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub fixtures: Arc<dyn FixtureRepository>,
    pub gateway: AuthGateway,
    pub endpoint: McpEndpoint,
}

impl AppState {
    pub fn new(fixtures: Arc<dyn FixtureRepository>, base_url: Url) -> Self {
        let sessions = SessionStore::new();
        let dispatcher = ToolDispatcher::new(fixtures.clone());
        Self {
            gateway: AuthGateway::new(sessions.clone(), fixtures.clone()),
            endpoint: McpEndpoint::new(sessions.clone(), dispatcher, base_url),
            sessions,
            fixtures,
        }
    }
}
