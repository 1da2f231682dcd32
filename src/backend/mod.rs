//! Backend trait for simulator connections

mod loopback;

pub use loopback::{LoopbackBackend, LoopbackHandle};

use crate::Result;
use crate::types::{BackendId, GroupTag, VariableGroupDefinition};

/// The external simulator boundary.
///
/// A backend exchanges fixed-size packed records with the simulator. It is
/// owned exclusively by one [`ConnectionSession`](crate::session::ConnectionSession),
/// which guarantees that calls never overlap.
///
/// Errors:
/// - [`SimError::Connection`](crate::SimError::Connection) means the simulator is gone
///   and the session must disconnect
/// - [`SimError::BackendIo`](crate::SimError::BackendIo) is a failed exchange on an
///   otherwise healthy connection
#[async_trait::async_trait]
pub trait Backend: Send + 'static {
    /// Which simulator this backend talks to
    fn id(&self) -> BackendId;

    /// Open the connection and complete the handshake.
    async fn open(&mut self) -> Result<()>;

    /// Declare a group layout under its definition identifier.
    ///
    /// Called once per group per session, before any traffic for the group.
    async fn register(&mut self, definition_id: u32, layout: &VariableGroupDefinition)
    -> Result<()>;

    /// Fetch the current record of a registered group.
    async fn request(&mut self, tag: GroupTag) -> Result<Vec<u8>>;

    /// Push a record to set the values of a registered group.
    async fn send(&mut self, tag: GroupTag, record: &[u8]) -> Result<()>;

    /// Close the connection. Closing twice is harmless.
    async fn close(&mut self) -> Result<()>;
}
