//! Percentage and status-line computation for progress updates.
//!
//! Both axes are optional: an axis whose total is still zero contributes a
//! factor of 1 to the denominator, so the other axis alone still yields a
//! usable fraction. The numerator is driven by the unit axis and merely
//! scaled by finished files — more units may yet be discovered inside
//! unfinished files, so this deliberately under-reports completeness.

use serde::Serialize;

use crate::state::Snapshot;

/// One computed update ready to push to a presentation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    /// Integer percentage in `[0, 100]`, floored from the raw fraction.
    pub percent: u32,
    /// Human-readable status line, e.g. `"Progress: file 1 of 3, module 0 of 2"`.
    pub status: String,
}

impl ProgressReport {
    /// Compute a report from raw counter values.
    ///
    /// # Arguments
    /// * `file_total` / `file_done` — first progress axis
    /// * `unit_total` / `unit_done` — second progress axis (displayed as "module")
    pub fn compute(file_total: u32, file_done: u32, unit_total: u32, unit_done: u32) -> Self {
        Self {
            percent: percent(file_total, file_done, unit_total, unit_done),
            status: status_line(file_total, file_done, unit_total, unit_done),
        }
    }

    /// Compute a report from a polled snapshot of the shared counters.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::compute(
            snapshot.file_total,
            snapshot.file_done,
            snapshot.unit_total,
            snapshot.unit_done,
        )
    }
}

/// Integer progress percentage for the given counters.
///
/// Denominators are clamped to at least 1, so a zero total can never divide
/// by zero; the raw fraction is capped at 100 and floored.
pub fn percent(file_total: u32, file_done: u32, unit_total: u32, unit_done: u32) -> u32 {
    let total = u64::from(unit_total.max(1)) * u64::from(file_total.max(1));
    let done = u64::from(unit_done) * u64::from(file_done.max(1));
    let value = (done as f64 * 100.0 / total as f64).min(100.0);
    value.floor() as u32
}

/// Status line for the given counters.
///
/// Includes the file clause only when `file_total` is non-zero and the module
/// clause only when `unit_total` is non-zero, comma-separated when both are
/// present.
pub fn status_line(file_total: u32, file_done: u32, unit_total: u32, unit_done: u32) -> String {
    let mut status = String::from("Progress:");
    if file_total != 0 {
        status.push_str(&format!(
            " file {} of {}{}",
            file_done,
            file_total,
            if unit_total != 0 { "," } else { "" }
        ));
    }
    if unit_total != 0 {
        status.push_str(&format!(" module {} of {}", unit_done, unit_total));
    }
    status
}
