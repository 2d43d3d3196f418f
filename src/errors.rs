//! Typed errors for server lifecycle operations.
//!
//! The polling loop itself never fails — degraded environments only downgrade
//! the presentation mode — so errors exist solely at the handle boundary:
//! starting a server twice, or joining a worker that panicked.

use thiserror::Error;

/// Errors from starting and stopping the progress server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Progress server is already running")]
    AlreadyRunning,

    #[error("Progress server worker panicked: {0}")]
    WorkerPanicked(String),
}
