use async_trait::async_trait;

use streamd_types::ControlResult;

/// Lifecycle shared by the IPC servers.
///
/// `start` binds and begins serving; a bind failure is `NoConnection` and
/// must leave the server stoppable. `stop` is idempotent and returns only
/// after in-flight work has drained.
#[async_trait]
pub trait Ipc: Send + Sync {
    async fn start(&self) -> ControlResult<()>;
    async fn stop(&self) -> ControlResult<()>;
}
