//! Shared progress state mutated by producers and polled by the server.
//!
//! One `ProgressState` lives for the whole process and is handed (as an
//! `Arc`) to every producer and to the [`ProgressServer`](crate::server::ProgressServer).
//! A session begins when some producer sets the label and ends when the
//! label is cleared. The four counters are plain atomics with no cross-field
//! transaction: the server reads them field by field once per tick and
//! tolerates torn snapshots, because it only acts on "something changed" and
//! reconverges on the next poll.
//!
//! Counters are cumulative across overlapping sessions. The producer API only
//! increments; the server subtracts a finished session's observed
//! contribution in [`ProgressState::session_cleanup`], and only full service
//! teardown ([`ProgressState::reset`]) zeroes everything.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Serialize, Serializer};
use tokio::sync::Notify;

/// Process-wide progress counters and control flags.
///
/// Label changes are tracked by pointer identity, not content: re-setting an
/// equal string is still observed as a change by the server.
pub struct ProgressState {
    label: Mutex<Option<Arc<str>>>,
    file_total: AtomicU32,
    file_done: AtomicU32,
    unit_total: AtomicU32,
    unit_done: AtomicU32,
    cancel_requested: AtomicBool,
    stopping: AtomicBool,
    unit_total_waiters: Notify,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    /// Create a fresh state with no active session and all counters at zero.
    pub fn new() -> Self {
        Self {
            label: Mutex::new(None),
            file_total: AtomicU32::new(0),
            file_done: AtomicU32::new(0),
            unit_total: AtomicU32::new(0),
            unit_done: AtomicU32::new(0),
            cancel_requested: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            unit_total_waiters: Notify::new(),
        }
    }

    /// Current session label, if a session is active.
    pub fn label(&self) -> Option<Arc<str>> {
        self.label.lock().unwrap().clone()
    }

    /// Replace the label wholesale, returning the previous value.
    ///
    /// Setting `Some` while another session's label is present swaps the text
    /// mid-session (the server keeps polling under the new text); setting
    /// `None` ends the session on the server's next tick.
    pub fn swap_label(&self, label: Option<Arc<str>>) -> Option<Arc<str>> {
        std::mem::replace(&mut *self.label.lock().unwrap(), label)
    }

    /// Start (or re-label) a session. Returns the previous label.
    pub fn set_label(&self, label: impl Into<Arc<str>>) -> Option<Arc<str>> {
        self.swap_label(Some(label.into()))
    }

    /// End the session. Returns the label that was cleared.
    pub fn clear_label(&self) -> Option<Arc<str>> {
        self.swap_label(None)
    }

    /// Add to the file-axis total.
    pub fn add_file_total(&self, n: u32) {
        self.file_total.fetch_add(n, Ordering::SeqCst);
    }

    /// Add to the file-axis done count.
    pub fn add_file_done(&self, n: u32) {
        self.file_done.fetch_add(n, Ordering::SeqCst);
    }

    /// Add to the unit-axis total.
    pub fn add_unit_total(&self, n: u32) {
        self.unit_total.fetch_add(n, Ordering::SeqCst);
    }

    /// Add to the unit-axis done count.
    pub fn add_unit_done(&self, n: u32) {
        self.unit_done.fetch_add(n, Ordering::SeqCst);
    }

    /// Whether the user canceled the visible dialog.
    ///
    /// Producers should poll this and wind down their batch when it turns
    /// true; the server itself only reports, it does not interrupt work.
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Mark the current session as canceled by the user.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Clear the cancellation flag. The server does this when a new session
    /// begins.
    pub fn clear_cancel(&self) {
        self.cancel_requested.store(false, Ordering::SeqCst);
    }

    /// Whether a stop of the whole server has been requested.
    pub fn stop_requested(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Ask the server to quiesce and exit its loop.
    pub fn request_stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    /// Withdraw a stop request. Called when a server (re)starts so a stale
    /// flag from a previous run cannot terminate the new one immediately.
    pub fn clear_stop(&self) {
        self.stopping.store(false, Ordering::SeqCst);
    }

    /// Read all five shared fields, one at a time.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            label: self.label(),
            file_total: self.file_total.load(Ordering::SeqCst),
            file_done: self.file_done.load(Ordering::SeqCst),
            unit_total: self.unit_total.load(Ordering::SeqCst),
            unit_done: self.unit_done.load(Ordering::SeqCst),
        }
    }

    /// Wait until the unit-axis total differs from `seen`.
    ///
    /// Only [`ProgressState::session_cleanup`] wakes waiters; a plain
    /// increment does not (producers that need a bound should wrap this in
    /// `tokio::time::timeout`). Returns the value observed at wake-up.
    pub async fn unit_total_changed(&self, seen: u32) -> u32 {
        loop {
            let notified = self.unit_total_waiters.notified();
            let current = self.unit_total.load(Ordering::SeqCst);
            if current != seen {
                return current;
            }
            notified.await;
        }
    }

    /// Subtract a finished session's observed contribution from the shared
    /// counters and wake unit-total waiters.
    ///
    /// This is a decrement, not a reset: amounts added by sessions that are
    /// still running stay in place. The subtraction uses the server's last
    /// polled snapshot, so a write racing between the final poll and this
    /// call can leave a small residue; that inaccuracy is bounded by one
    /// tick's worth of updates and accepted.
    pub(crate) fn session_cleanup(&self, observed: &Snapshot) {
        self.file_done.fetch_sub(observed.file_done, Ordering::SeqCst);
        self.unit_done.fetch_sub(observed.unit_done, Ordering::SeqCst);
        self.file_total.fetch_sub(observed.file_total, Ordering::SeqCst);
        self.unit_total.fetch_sub(observed.unit_total, Ordering::SeqCst);
        self.unit_total_waiters.notify_waiters();
    }

    /// Unconditionally release the label and zero all four counters.
    ///
    /// Full service teardown, as opposed to the per-session decrement of
    /// [`ProgressState::session_cleanup`]. The cancel and stop flags are left
    /// as they are, and unit-total waiters are not woken.
    pub fn reset(&self) {
        self.swap_label(None);
        self.file_total.store(0, Ordering::SeqCst);
        self.file_done.store(0, Ordering::SeqCst);
        self.unit_total.store(0, Ordering::SeqCst);
        self.unit_done.store(0, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for ProgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressState")
            .field("label", &self.label())
            .field("file_total", &self.file_total.load(Ordering::SeqCst))
            .field("file_done", &self.file_done.load(Ordering::SeqCst))
            .field("unit_total", &self.unit_total.load(Ordering::SeqCst))
            .field("unit_done", &self.unit_done.load(Ordering::SeqCst))
            .field("cancel_requested", &self.cancel_requested())
            .field("stopping", &self.stop_requested())
            .finish()
    }
}

/// One per-tick read of the five shared fields.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Session label; `None` means the session is over (or never started).
    #[serde(serialize_with = "serialize_label")]
    pub label: Option<Arc<str>>,
    pub file_total: u32,
    pub file_done: u32,
    pub unit_total: u32,
    pub unit_done: u32,
}

impl Snapshot {
    /// Whether anything changed relative to an earlier snapshot.
    ///
    /// The label is compared by pointer identity, the counters by value.
    pub fn differs_from(&self, earlier: &Snapshot) -> bool {
        !same_label(&self.label, &earlier.label)
            || self.file_total != earlier.file_total
            || self.file_done != earlier.file_done
            || self.unit_total != earlier.unit_total
            || self.unit_done != earlier.unit_done
    }
}

fn same_label(a: &Option<Arc<str>>, b: &Option<Arc<str>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

fn serialize_label<S>(label: &Option<Arc<str>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match label {
        Some(text) => serializer.serialize_some(text.as_ref()),
        None => serializer.serialize_none(),
    }
}
