//! Core domain for the finmock control-plane mock: who is logged in, which
//! tools exist, and where their canned documents live.

pub mod dispatch;
pub mod error;
pub mod fixtures;
pub mod gateway;
pub mod identity;
pub mod session;
pub mod tools;

pub use dispatch::{DispatchError, ToolDispatcher};
pub use fixtures::{Fixture, FixtureError, FixtureRepository, FsFixtureRepository, InMemoryFixtures};
pub use gateway::{AuthGateway, LoginError, LoginOutcome};
pub use identity::Identity;
pub use session::{Session, SessionError, SessionState, SessionStore};
pub use tools::{Tool, UnknownTool};
