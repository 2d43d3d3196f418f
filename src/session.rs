//! Scoped session labels.
//!
//! A [`SessionScope`] marks a region of producer code as one reportable
//! phase: constructing it publishes the label that opens (or re-titles) the
//! visible session, and dropping it restores whatever label was current
//! before. Nesting scopes therefore stacks phases naturally — the innermost
//! label wins, and unwinding restores outer labels in order.

use std::sync::Arc;

use tracing::debug;

use crate::state::ProgressState;

/// RAII guard that owns the session label for its lifetime.
#[must_use = "dropping the scope immediately restores the previous label"]
pub struct SessionScope {
    state: Arc<ProgressState>,
    previous: Option<Arc<str>>,
}

impl SessionScope {
    /// Publish `label` and remember the label it displaced.
    pub fn enter(state: &Arc<ProgressState>, label: impl Into<Arc<str>>) -> Self {
        let label = label.into();
        debug!(%label, "entering progress session");
        let previous = state.swap_label(Some(label));
        Self {
            state: state.clone(),
            previous,
        }
    }

    /// Replace the visible label without touching the restore point.
    ///
    /// The running session continues under the new title; counters are
    /// unaffected.
    pub fn set_label(&self, label: impl Into<Arc<str>>) {
        let _ = self.state.swap_label(Some(label.into()));
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        let _ = self.state.swap_label(self.previous.take());
    }
}
