use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::fixtures::{Fixture, FixtureError, FixtureRepository};
use crate::identity::Identity;
use crate::tools::{Tool, UnknownTool};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownTool(#[from] UnknownTool),

    #[error("no '{tool}' data is provisioned for identity '{identity}'")]
    FixtureNotFound { identity: Identity, tool: Tool },

    #[error("fixture storage failure: {0}")]
    Storage(#[source] FixtureError),
}

impl From<FixtureError> for DispatchError {
    fn from(err: FixtureError) -> Self {
        match err {
            FixtureError::NotFound { identity, tool } => {
                DispatchError::FixtureNotFound { identity, tool }
            }
            other => DispatchError::Storage(other),
        }
    }
}

/// Resolves tool calls to fixture documents for an authenticated identity.
#[derive(Clone)]
pub struct ToolDispatcher {
    fixtures: Arc<dyn FixtureRepository>,
}

impl ToolDispatcher {
    pub fn new(fixtures: Arc<dyn FixtureRepository>) -> Self {
        Self { fixtures }
    }

    /// Loads the document for `(identity, tool_name)`. Arguments are accepted
    /// but not interpreted; every tool is a static lookup.
    pub async fn invoke(
        &self,
        identity: &Identity,
        tool_name: &str,
        _arguments: &Map<String, Value>,
    ) -> Result<Fixture, DispatchError> {
        let tool: Tool = tool_name.parse()?;
        let fixture = self.fixtures.load(identity, tool).await?;
        tracing::debug!(
            identity = %identity,
            tool = tool.as_str(),
            bytes = fixture.as_str().len(),
            "fixture served"
        );
        Ok(fixture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::InMemoryFixtures;
    use serde_json::json;

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(Arc::new(
            InMemoryFixtures::new()
                .with_document("1010101010", Tool::FetchNetWorth, r#"{"netWorth": 1}"#)
                .with_identity("2020202020"),
        ))
    }

    #[tokio::test]
    async fn invoke_returns_document_unmodified() {
        let fixture = dispatcher()
            .invoke(&Identity::new("1010101010"), "fetch_net_worth", &Map::new())
            .await
            .expect("fixture");
        assert_eq!(fixture.as_str(), r#"{"netWorth": 1}"#);
    }

    #[tokio::test]
    async fn arguments_do_not_affect_lookup() {
        let args = json!({"from": "2024-01-01", "limit": 10});
        let args = args.as_object().cloned().unwrap_or_default();
        let fixture = dispatcher()
            .invoke(&Identity::new("1010101010"), "fetch_net_worth", &args)
            .await
            .expect("fixture");
        assert_eq!(fixture.as_str(), r#"{"netWorth": 1}"#);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_by_name() {
        let err = dispatcher()
            .invoke(&Identity::new("1010101010"), "fetch_crypto", &Map::new())
            .await
            .expect_err("unknown tool");
        assert!(matches!(
            err,
            DispatchError::UnknownTool(UnknownTool(ref name)) if name == "fetch_crypto"
        ));
    }

    #[tokio::test]
    async fn partial_coverage_is_fixture_not_found() {
        let err = dispatcher()
            .invoke(&Identity::new("2020202020"), "fetch_net_worth", &Map::new())
            .await
            .expect_err("missing fixture");
        assert!(matches!(
            err,
            DispatchError::FixtureNotFound {
                tool: Tool::FetchNetWorth,
                ..
            }
        ));
    }

    #[test]
    fn storage_failures_stay_distinct_from_missing_fixtures() {
        let err = DispatchError::from(FixtureError::Corrupt {
            path: "x/fetch_net_worth.json".into(),
        });
        assert!(matches!(err, DispatchError::Storage(_)));
    }
}
