//! Host-owned modal dialog seam.
//!
//! The fallback presentation path: when no in-process overlay surface exists,
//! the server asks the host for a modal dialog and drives it exclusively
//! through the [`UiDispatcher`](crate::dispatch::UiDispatcher) — the dialog's
//! methods are only ever invoked on the host's designated UI worker.

use std::sync::Arc;

/// Severity styling for a dialog. Progress dialogs are always
/// normal-severity; both presets below say so explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Normal,
}

/// Visual and behavioral flags for a progress dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogOptions {
    pub severity: Severity,
    /// Suppress the host's open/close sound effects.
    pub mute_sound: bool,
    /// Do not dim the rest of the screen behind the dialog.
    pub invisible_background: bool,
    /// Whether the user can dismiss the dialog.
    pub allow_cancel: bool,
    /// Number of progress bars the dialog carries.
    pub progress_bars: u8,
}

impl DialogOptions {
    /// Options for the in-process overlay variant: quiet, background kept
    /// visible through it, not user-dismissable, one bar.
    pub fn overlay() -> Self {
        Self {
            severity: Severity::Normal,
            mute_sound: true,
            invisible_background: true,
            allow_cancel: false,
            progress_bars: 1,
        }
    }

    /// Options for the host-owned fallback dialog: one bar, dismissable so
    /// the close callback can double as the cancel path.
    pub fn fallback() -> Self {
        Self {
            severity: Severity::Normal,
            mute_sound: false,
            invisible_background: true,
            allow_cancel: true,
            progress_bars: 1,
        }
    }
}

/// How a dialog was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStatus {
    /// Closed programmatically with an accepted result.
    Ok,
    /// Dismissed by the user.
    Canceled,
}

/// Callback invoked exactly once when the dialog closes.
pub type CloseHandler = Box<dyn Fn(CloseStatus) + Send + Sync>;

/// A host-owned modal dialog.
///
/// Every method is called from the host's designated UI worker (via the
/// dispatch queue), never directly from the server loop.
pub trait HostDialog: Send + Sync {
    /// Make the dialog visible with the given title and body text.
    fn open(&self, title: &str, message: &str);
    /// Replace the body text.
    fn set_message(&self, text: &str);
    /// Set the caption under progress bar `index`.
    fn bar_set_message(&self, index: usize, text: &str);
    /// Set progress bar `index` to `percent` (0–100).
    fn bar_set_value(&self, index: usize, percent: u32);
    /// Close the dialog; `accepted` distinguishes a completed session from a
    /// discarded one.
    fn close(&self, accepted: bool);
}

/// Constructs host dialogs on demand.
pub trait DialogFactory: Send + Sync {
    /// Build a dialog. The host must invoke `on_close` exactly once when the
    /// dialog is dismissed, passing who closed it.
    fn create_dialog(&self, options: DialogOptions, on_close: CloseHandler) -> Arc<dyn HostDialog>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_options_disallow_cancel() {
        let options = DialogOptions::overlay();
        assert!(!options.allow_cancel);
        assert!(options.mute_sound);
        assert!(options.invisible_background);
        assert_eq!(options.progress_bars, 1);
        assert_eq!(options.severity, Severity::Normal);
    }

    #[test]
    fn fallback_options_allow_cancel() {
        let options = DialogOptions::fallback();
        assert!(options.allow_cancel);
        assert!(!options.mute_sound);
        assert_eq!(options.progress_bars, 1);
        assert_eq!(options.severity, Severity::Normal);
    }
}
