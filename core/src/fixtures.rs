//! Read-only access to canned tool documents.
//!
//! On disk the layout is one directory per identity with one
//! `<tool_name>.json` document per tool inside it. Documents are opaque to
//! the server and are returned byte-for-byte.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::Identity;
use crate::tools::Tool;

/// Raw content of one fixture document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    content: String,
}

impl Fixture {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("no fixture for tool '{tool}' under identity '{identity}'")]
    NotFound { identity: Identity, tool: Tool },

    #[error("failed to read fixture storage at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("fixture at {path} is not valid UTF-8")]
    Corrupt { path: PathBuf },
}

#[async_trait]
pub trait FixtureRepository: Send + Sync {
    /// Whether fixture data has been provisioned for `identity` at all.
    async fn has_identity(&self, identity: &Identity) -> Result<bool, FixtureError>;

    /// Every provisioned identity, sorted.
    async fn identities(&self) -> Result<Vec<Identity>, FixtureError>;

    async fn load(&self, identity: &Identity, tool: Tool) -> Result<Fixture, FixtureError>;
}

/// Filesystem-backed repository rooted at a directory of identity folders.
#[derive(Debug, Clone)]
pub struct FsFixtureRepository {
    root: PathBuf,
}

impl FsFixtureRepository {
    /// Opens the repository, failing if `root` is not an existing directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let root = root.into();
        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|source| FixtureError::Storage {
                path: root.clone(),
                source,
            })?;
        if !metadata.is_dir() {
            return Err(FixtureError::Storage {
                path: root,
                source: io::Error::new(
                    io::ErrorKind::NotADirectory,
                    "fixture root is not a directory",
                ),
            });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identity_dir(&self, identity: &Identity) -> Option<PathBuf> {
        identity
            .is_path_safe()
            .then(|| self.root.join(identity.as_str()))
    }
}

#[async_trait]
impl FixtureRepository for FsFixtureRepository {
    async fn has_identity(&self, identity: &Identity) -> Result<bool, FixtureError> {
        let Some(dir) = self.identity_dir(identity) else {
            return Ok(false);
        };
        match tokio::fs::metadata(&dir).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(FixtureError::Storage { path: dir, source }),
        }
    }

    async fn identities(&self) -> Result<Vec<Identity>, FixtureError> {
        let storage_err = |source| FixtureError::Storage {
            path: self.root.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(storage_err)?;
        let mut identities = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(storage_err)? {
            // Follows symlinks, like `has_identity`.
            let is_dir = match tokio::fs::metadata(entry.path()).await {
                Ok(metadata) => metadata.is_dir(),
                Err(err) if err.kind() == io::ErrorKind::NotFound => false,
                Err(source) => {
                    return Err(FixtureError::Storage {
                        path: entry.path(),
                        source,
                    });
                }
            };
            if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                identities.push(Identity::new(name));
            }
        }
        identities.sort();
        Ok(identities)
    }

    async fn load(&self, identity: &Identity, tool: Tool) -> Result<Fixture, FixtureError> {
        let not_found = || FixtureError::NotFound {
            identity: identity.clone(),
            tool,
        };
        let Some(dir) = self.identity_dir(identity) else {
            return Err(not_found());
        };
        let path = dir.join(tool.file_name());

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(source) => return Err(FixtureError::Storage { path, source }),
        };
        let content = String::from_utf8(bytes).map_err(|_| FixtureError::Corrupt { path })?;
        Ok(Fixture::new(content))
    }
}

/// In-memory repository, mainly for tests. An identity counts as
/// provisioned once it is registered, even with no documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFixtures {
    identities: BTreeSet<Identity>,
    documents: BTreeMap<(Identity, &'static str), String>,
}

impl InMemoryFixtures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(mut self, identity: impl Into<Identity>) -> Self {
        self.identities.insert(identity.into());
        self
    }

    pub fn with_document(
        mut self,
        identity: impl Into<Identity>,
        tool: Tool,
        content: impl Into<String>,
    ) -> Self {
        let identity = identity.into();
        self.identities.insert(identity.clone());
        self.documents
            .insert((identity, tool.as_str()), content.into());
        self
    }
}

#[async_trait]
impl FixtureRepository for InMemoryFixtures {
    async fn has_identity(&self, identity: &Identity) -> Result<bool, FixtureError> {
        Ok(self.identities.contains(identity))
    }

    async fn identities(&self) -> Result<Vec<Identity>, FixtureError> {
        Ok(self.identities.iter().cloned().collect())
    }

    async fn load(&self, identity: &Identity, tool: Tool) -> Result<Fixture, FixtureError> {
        self.documents
            .get(&(identity.clone(), tool.as_str()))
            .map(|content| Fixture::new(content.clone()))
            .ok_or_else(|| FixtureError::NotFound {
                identity: identity.clone(),
                tool,
            })
    }
}
