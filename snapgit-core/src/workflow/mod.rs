//! The snapshot workflow: detection, the three mutations and the facade
//!
//! Each component is usable on its own; [`WorkflowFacade`] wires them
//! together behind the tool check, the per-repository lock and the
//! precondition table.

mod commit;
mod connect;
mod detect;
mod facade;
mod init;
mod lock;
mod probe;
mod result;
mod retry;
mod state;
mod sync;

pub use commit::{snapshot_message, SnapshotCommitter};
pub use connect::RemoteConnector;
pub use detect::StateDetector;
pub use facade::{StartupReport, WorkflowFacade};
pub use init::{Initializer, INITIAL_COMMIT_MESSAGE};
pub use lock::PathLocks;
pub use probe::ToolProbe;
pub use result::{Outcome, WorkflowResult};
pub use retry::RetryPolicy;
pub use state::{Action, ActionKind, RepositoryState, ToolAvailability, WorkflowPhase};
pub use sync::SyncCoordinator;
