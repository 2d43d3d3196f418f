//! Interfaces the hosting process supplies to the progress server.
//!
//! Everything the server consumes from its environment is collected in
//! [`HostEnv`]: the renderer readiness signal, the two dialog surfaces, the
//! transient-notification queue, the graceful-exit hook, and the process
//! abort flag. Every piece is optional except the abort flag — a bare
//! `HostEnv::new()` degrades the server to message-only sessions with no
//! visible output, which is a valid headless configuration.

pub mod dialog;
pub mod overlay;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

pub use dialog::{CloseHandler, CloseStatus, DialogFactory, DialogOptions, HostDialog, Severity};
pub use overlay::{OverlayDialog, OverlayHost};

/// Readiness signal for the host's rendering subsystem.
///
/// The server waits (bounded) for readiness before selecting a session's
/// presentation target, so an overlay is not requested mid-initialization.
/// Missing readiness is never fatal — the wait simply times out.
#[async_trait]
pub trait RendererStatus: Send + Sync {
    /// Resolve once the renderer has finished initializing. May be pending
    /// forever; the server applies its own timeout.
    async fn ready(&self);
}

/// Queue of transient, non-modal notifications.
///
/// Used by message-only sessions: a hint when counters move, and a refresh
/// every poll tick to keep queued notifications flowing. Both methods default
/// to no-ops so hosts only implement what they surface.
pub trait NoticeQueue: Send + Sync {
    /// Surface a short "background work in progress" hint. May be called on
    /// every observed change; implementations are free to coalesce.
    fn show_work_hint(&self) {}
    /// Pump pending notifications.
    fn refresh(&self) {}
}

/// Hook through which a user-initiated dialog cancel asks the host process to
/// shut down gracefully.
pub trait ExitRequest: Send + Sync {
    fn request_exit(&self);
}

/// Bundle of host-supplied collaborators handed to the server at startup.
pub struct HostEnv {
    pub renderer: Option<Arc<dyn RendererStatus>>,
    pub overlay: Option<Arc<dyn OverlayHost>>,
    pub dialogs: Option<Arc<dyn DialogFactory>>,
    pub notices: Option<Arc<dyn NoticeQueue>>,
    pub exit: Option<Arc<dyn ExitRequest>>,
    /// External process-teardown flag; the server treats it like a stop
    /// request but never sets it.
    pub abort: Arc<AtomicBool>,
}

impl Default for HostEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEnv {
    /// An empty environment: no surfaces, no renderer, a fresh abort flag.
    pub fn new() -> Self {
        Self {
            renderer: None,
            overlay: None,
            dialogs: None,
            notices: None,
            exit: None,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn RendererStatus>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_overlay(mut self, overlay: Arc<dyn OverlayHost>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_dialogs(mut self, dialogs: Arc<dyn DialogFactory>) -> Self {
        self.dialogs = Some(dialogs);
        self
    }

    pub fn with_notices(mut self, notices: Arc<dyn NoticeQueue>) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn with_exit(mut self, exit: Arc<dyn ExitRequest>) -> Self {
        self.exit = Some(exit);
        self
    }

    /// Share an existing abort flag instead of the fresh default.
    pub fn with_abort_flag(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    /// Whether the hosting process is tearing down.
    pub fn is_aborting(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SilentNotices;
    impl NoticeQueue for SilentNotices {}

    #[test]
    fn bare_env_has_no_surfaces() {
        let env = HostEnv::new();
        assert!(env.renderer.is_none());
        assert!(env.overlay.is_none());
        assert!(env.dialogs.is_none());
        assert!(env.notices.is_none());
        assert!(env.exit.is_none());
        assert!(!env.is_aborting());
    }

    #[test]
    fn abort_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let env = HostEnv::new().with_abort_flag(flag.clone());
        flag.store(true, Ordering::SeqCst);
        assert!(env.is_aborting());
    }

    #[test]
    fn notice_queue_methods_default_to_noops() {
        let notices = SilentNotices;
        notices.show_work_hint();
        notices.refresh();
    }
}
