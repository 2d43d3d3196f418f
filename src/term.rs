//! Terminal presentation of progress sessions, rendered via `indicatif`.
//!
//! The crate's built-in [`OverlayHost`]: each session becomes one bar on a
//! shared `MultiProgress`, stacked alongside anything else the host draws.
//! Also implements [`NoticeQueue`] for message-only sessions, printing a
//! single dimmed hint line the first time background work is reported.

use std::sync::atomic::{AtomicBool, Ordering};

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::host::{DialogOptions, NoticeQueue, OverlayDialog, OverlayHost};

/// Terminal surface for progress sessions.
pub struct TermUi {
    multi: MultiProgress,
    hint_shown: AtomicBool,
}

impl TermUi {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            hint_shown: AtomicBool::new(false),
        }
    }

    /// Print a line via `MultiProgress`, falling back to `eprintln!` if the
    /// rich UI fails.
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }
}

impl Default for TermUi {
    fn default() -> Self {
        Self::new()
    }
}

fn session_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}")
        .expect("progress bar template is a valid static string")
        .progress_chars("█▓▒░")
}

impl OverlayHost for TermUi {
    /// One bar per session, headline in the prefix, status line in the
    /// message. Refuses when stderr is not a terminal so piped runs fall
    /// back to plainer output.
    fn create_progress_dialog(
        &self,
        _options: DialogOptions,
        text: &str,
    ) -> Option<Box<dyn OverlayDialog>> {
        if !console::user_attended_stderr() {
            return None;
        }

        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(session_bar_style());
        bar.set_prefix(text.to_string());
        Some(Box::new(TermOverlay { bar }))
    }
}

impl NoticeQueue for TermUi {
    fn show_work_hint(&self) {
        if !self.hint_shown.swap(true, Ordering::SeqCst) {
            self.print_line(
                style("Background work in progress, output may pause")
                    .dim()
                    .to_string(),
            );
        }
    }
}

struct TermOverlay {
    bar: ProgressBar,
}

impl OverlayDialog for TermOverlay {
    fn set_text(&mut self, text: &str) {
        self.bar.set_prefix(text.to_string());
    }

    fn bar_set_message(&mut self, _index: usize, text: &str) {
        self.bar.set_message(text.to_string());
    }

    fn bar_set_value(&mut self, _index: usize, percent: u32) {
        self.bar.set_position(u64::from(percent));
    }

    fn refresh(&mut self) {
        self.bar.tick();
    }

    fn close(&mut self) {
        self.bar.finish_and_clear();
    }
}
