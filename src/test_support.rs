//! Recording fakes shared by the unit tests.
//!
//! Every fake appends a compact `"call:arg"` line to a shared [`CallLog`] so
//! tests can assert on exact call sequences across surfaces.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::host::{
    CloseHandler, CloseStatus, DialogFactory, DialogOptions, ExitRequest, HostDialog,
    OverlayDialog, OverlayHost, RendererStatus,
};

pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub(crate) struct RecordingOverlay {
    pub log: CallLog,
}

impl OverlayDialog for RecordingOverlay {
    fn set_text(&mut self, text: &str) {
        self.log.lock().unwrap().push(format!("text:{text}"));
    }
    fn bar_set_message(&mut self, index: usize, text: &str) {
        self.log.lock().unwrap().push(format!("bar_msg:{index}:{text}"));
    }
    fn bar_set_value(&mut self, index: usize, percent: u32) {
        self.log.lock().unwrap().push(format!("bar_val:{index}:{percent}"));
    }
    fn refresh(&mut self) {
        self.log.lock().unwrap().push("refresh".into());
    }
    fn close(&mut self) {
        self.log.lock().unwrap().push("close".into());
    }
}

/// Overlay host whose widgets all record into one shared log. Flip
/// `available` off to simulate a surface that cannot display right now.
pub(crate) struct RecordingOverlayHost {
    pub log: CallLog,
    pub available: AtomicBool,
}

impl RecordingOverlayHost {
    pub fn new() -> Self {
        Self {
            log: call_log(),
            available: AtomicBool::new(true),
        }
    }

    pub fn refusing() -> Self {
        let host = Self::new();
        host.available.store(false, Ordering::SeqCst);
        host
    }
}

impl OverlayHost for RecordingOverlayHost {
    fn create_progress_dialog(
        &self,
        _options: DialogOptions,
        text: &str,
    ) -> Option<Box<dyn OverlayDialog>> {
        if !self.available.load(Ordering::SeqCst) {
            return None;
        }
        self.log.lock().unwrap().push(format!("create:{text}"));
        Some(Box::new(RecordingOverlay {
            log: self.log.clone(),
        }))
    }
}

pub(crate) struct RecordingDialog {
    pub log: CallLog,
    on_close: Mutex<Option<CloseHandler>>,
}

impl RecordingDialog {
    /// Simulate the user dismissing the dialog.
    pub fn dismiss(&self) {
        if let Some(handler) = &*self.on_close.lock().unwrap() {
            handler(CloseStatus::Canceled);
        }
    }
}

impl HostDialog for RecordingDialog {
    fn open(&self, title: &str, message: &str) {
        self.log.lock().unwrap().push(format!("open:{title}:{message}"));
    }
    fn set_message(&self, text: &str) {
        self.log.lock().unwrap().push(format!("msg:{text}"));
    }
    fn bar_set_message(&self, index: usize, text: &str) {
        self.log.lock().unwrap().push(format!("bar_msg:{index}:{text}"));
    }
    fn bar_set_value(&self, index: usize, percent: u32) {
        self.log.lock().unwrap().push(format!("bar_val:{index}:{percent}"));
    }
    fn close(&self, accepted: bool) {
        self.log.lock().unwrap().push(format!("close:{accepted}"));
    }
}

/// Dialog factory that keeps a handle to the last dialog it built so tests
/// can poke its close callback.
pub(crate) struct RecordingFactory {
    pub log: CallLog,
    pub last: Mutex<Option<Arc<RecordingDialog>>>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self {
            log: call_log(),
            last: Mutex::new(None),
        }
    }

    pub fn last_dialog(&self) -> Arc<RecordingDialog> {
        self.last.lock().unwrap().clone().expect("no dialog created yet")
    }
}

impl DialogFactory for RecordingFactory {
    fn create_dialog(&self, _options: DialogOptions, on_close: CloseHandler) -> Arc<dyn HostDialog> {
        let dialog = Arc::new(RecordingDialog {
            log: self.log.clone(),
            on_close: Mutex::new(Some(on_close)),
        });
        *self.last.lock().unwrap() = Some(dialog.clone());
        dialog
    }
}

pub(crate) struct RecordingExit {
    pub log: CallLog,
}

impl ExitRequest for RecordingExit {
    fn request_exit(&self) {
        self.log.lock().unwrap().push("exit".into());
    }
}

pub(crate) struct InstantRenderer;

#[async_trait]
impl RendererStatus for InstantRenderer {
    async fn ready(&self) {}
}

/// Renderer whose readiness never resolves; selection must time out past it.
pub(crate) struct StalledRenderer;

#[async_trait]
impl RendererStatus for StalledRenderer {
    async fn ready(&self) {
        std::future::pending::<()>().await;
    }
}
