//! In-process overlay surface seam.
//!
//! The preferred presentation path. Overlay widgets are owned by the server
//! worker and mutated with plain synchronous calls — no dispatch hop.

use super::dialog::DialogOptions;

/// A progress widget drawn by the in-process overlay surface.
pub trait OverlayDialog: Send {
    /// Replace the headline text.
    fn set_text(&mut self, text: &str);
    /// Set the caption under progress bar `index`.
    fn bar_set_message(&mut self, index: usize, text: &str);
    /// Set progress bar `index` to `percent` (0–100).
    fn bar_set_value(&mut self, index: usize, percent: u32);
    /// Force a redraw without changing content.
    fn refresh(&mut self);
    /// Remove the widget from the screen.
    fn close(&mut self);
}

/// Creates overlay progress widgets.
pub trait OverlayHost: Send + Sync {
    /// Instantiate and show a progress widget, or `None` if the surface
    /// cannot display one right now (e.g. nothing is rendering yet). A
    /// `None` makes the server fall back to the next presentation mode.
    fn create_progress_dialog(
        &self,
        options: DialogOptions,
        text: &str,
    ) -> Option<Box<dyn OverlayDialog>>;
}
