//! The presentation target a session renders into.
//!
//! Selected once per session, then driven by the polling loop. The three
//! variants differ in call discipline: overlay widgets are owned by the
//! worker and mutated directly, host dialogs are shared and only ever touched
//! through the UI dispatch queue, and the message-only target has no widget
//! at all (hints and refreshes go through the notice queue, handled by the
//! worker itself).

use std::sync::Arc;

use crate::dispatch::UiDispatcher;
use crate::host::{HostDialog, OverlayDialog};
use crate::report::ProgressReport;

const PROGRESS_BAR: usize = 0;

pub(crate) enum ActiveTarget {
    /// In-process overlay widget, owned exclusively by the worker.
    Overlay(Box<dyn OverlayDialog>),
    /// Host-owned modal dialog, updated via dispatched closures.
    Dialog(Arc<dyn HostDialog>),
    /// No widget; counter movement surfaces as transient notices only.
    Messages,
}

impl ActiveTarget {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            ActiveTarget::Overlay(_) => "overlay",
            ActiveTarget::Dialog(_) => "dialog",
            ActiveTarget::Messages => "messages",
        }
    }

    pub(crate) fn is_messages(&self) -> bool {
        matches!(self, ActiveTarget::Messages)
    }

    /// Push one coalesced update: headline text, bar caption, bar value.
    pub(crate) fn push_report(
        &mut self,
        dispatcher: &UiDispatcher,
        label: &Arc<str>,
        report: ProgressReport,
    ) {
        match self {
            ActiveTarget::Overlay(overlay) => {
                overlay.set_text(label);
                overlay.bar_set_message(PROGRESS_BAR, &report.status);
                overlay.bar_set_value(PROGRESS_BAR, report.percent);
            }
            ActiveTarget::Dialog(dialog) => {
                let dialog = dialog.clone();
                let label = label.clone();
                dispatcher.dispatch(move || {
                    dialog.set_message(&label);
                    dialog.bar_set_message(PROGRESS_BAR, &report.status);
                    dialog.bar_set_value(PROGRESS_BAR, report.percent);
                });
            }
            ActiveTarget::Messages => {}
        }
    }

    /// Dismiss the visible surface at the end of a completed session.
    ///
    /// Returns the overlay widget (now closed) so the worker can keep it
    /// around for a final shutdown notice.
    pub(crate) fn close(self, dispatcher: &UiDispatcher) -> Option<Box<dyn OverlayDialog>> {
        match self {
            ActiveTarget::Overlay(mut overlay) => {
                overlay.close();
                Some(overlay)
            }
            ActiveTarget::Dialog(dialog) => {
                dispatcher.dispatch(move || dialog.close(true));
                None
            }
            ActiveTarget::Messages => None,
        }
    }

    /// Extract the overlay widget without closing anything. Used when the
    /// worker halts mid-session and leaves the surface as-is.
    pub(crate) fn into_overlay(self) -> Option<Box<dyn OverlayDialog>> {
        match self {
            ActiveTarget::Overlay(overlay) => Some(overlay),
            _ => None,
        }
    }
}
