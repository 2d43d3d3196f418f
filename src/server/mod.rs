//! The progress server: one consumer task that turns shared counters into a
//! single visible progress surface.
//!
//! Producers never talk to the UI. They bump [`ProgressState`] and move on;
//! the server polls that state at a fixed cadence, coalesces whatever changed
//! since the last tick into one update, and pushes it to exactly one
//! presentation target per session.
//!
//! ## Lifecycle
//!
//! The worker cycles through sessions until a stop or host abort:
//!
//! 1. **Idle** — poll until some producer publishes a session label.
//! 2. **Target selection** — wait (bounded) for the renderer, then pick the
//!    first workable surface: in-process overlay, host dialog, or
//!    message-only notices.
//! 3. **Active** — poll the counters, push coalesced updates on change.
//! 4. **Drain** — when the label clears, dismiss the surface and subtract
//!    this session's contribution from the shared counters, then go idle.
//!
//! A stop request short-circuits all four phases; a session interrupted this
//! way deliberately skips its drain step, and [`ProgressServer::stop`]
//! releases the counters wholesale instead.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use taskgauge::config::ServerConfig;
//! use taskgauge::dispatch::UiDispatcher;
//! use taskgauge::host::HostEnv;
//! use taskgauge::server::ProgressServer;
//! use taskgauge::session::SessionScope;
//! use taskgauge::state::ProgressState;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let state = Arc::new(ProgressState::new());
//! let (dispatcher, queue) = UiDispatcher::channel();
//! tokio::spawn(queue.run());
//!
//! let mut server = ProgressServer::new(
//!     state.clone(),
//!     ServerConfig::default(),
//!     HostEnv::new(),
//!     dispatcher,
//! );
//! server.start()?;
//!
//! let scope = SessionScope::enter(&state, "Compiling modules");
//! state.add_unit_total(100);
//! for _ in 0..100 {
//!     // ... one unit of real work ...
//!     state.add_unit_done(1);
//! }
//! drop(scope);
//!
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```

mod target;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::config::ServerConfig;
use crate::dispatch::UiDispatcher;
use crate::errors::ServerError;
use crate::host::{CloseHandler, CloseStatus, DialogOptions, HostEnv, OverlayDialog};
use crate::report::ProgressReport;
use crate::state::{ProgressState, Snapshot};

use target::ActiveTarget;

/// Handle that owns the consumer task.
///
/// Dropping a running server signals its worker and detaches it; the worker
/// notices within one tick and exits. Call [`ProgressServer::stop`] instead
/// when you need the shutdown joined and the shared counters released.
pub struct ProgressServer {
    state: Arc<ProgressState>,
    config: ServerConfig,
    env: Arc<HostEnv>,
    dispatcher: UiDispatcher,
    stop_wake: Arc<Notify>,
    worker: Option<JoinHandle<()>>,
}

impl ProgressServer {
    pub fn new(
        state: Arc<ProgressState>,
        config: ServerConfig,
        env: HostEnv,
        dispatcher: UiDispatcher,
    ) -> Self {
        Self {
            state,
            config,
            env: Arc::new(env),
            dispatcher,
            stop_wake: Arc::new(Notify::new()),
            worker: None,
        }
    }

    /// Spawn the consumer task. Must be called within a Tokio runtime.
    ///
    /// Any stale stop request is withdrawn before the task starts, so a
    /// `start` immediately followed by [`ProgressServer::stop`] still shuts
    /// down cleanly.
    pub fn start(&mut self) -> Result<(), ServerError> {
        if let Some(worker) = &self.worker {
            if !worker.is_finished() {
                return Err(ServerError::AlreadyRunning);
            }
        }

        self.state.clear_stop();
        let worker = Worker {
            state: self.state.clone(),
            config: self.config.clone(),
            env: self.env.clone(),
            dispatcher: self.dispatcher.clone(),
            stop_wake: self.stop_wake.clone(),
            parked_overlay: None,
        };
        self.worker = Some(tokio::spawn(worker.run()));
        info!("Progress server started");
        Ok(())
    }

    /// Signal the worker, wait for it to exit, and release the shared state.
    ///
    /// Idempotent: stopping a server that never started (or already stopped)
    /// still releases the counters and returns `Ok`.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        self.state.request_stop();
        self.stop_wake.notify_waiters();

        let joined = match self.worker.take() {
            Some(worker) => worker.await,
            None => Ok(()),
        };
        self.state.reset();
        info!("Progress server stopped");

        match joined {
            Ok(()) => Ok(()),
            Err(err) if err.is_panic() => {
                let panic = err.into_panic();
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_string());
                Err(ServerError::WorkerPanicked(message))
            }
            Err(err) => {
                warn!("Progress worker join failed without panic: {err}");
                Ok(())
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    pub fn state(&self) -> &Arc<ProgressState> {
        &self.state
    }
}

impl Drop for ProgressServer {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.state.request_stop();
            self.stop_wake.notify_waiters();
        }
    }
}

/// The consumer task's private state.
struct Worker {
    state: Arc<ProgressState>,
    config: ServerConfig,
    env: Arc<HostEnv>,
    dispatcher: UiDispatcher,
    stop_wake: Arc<Notify>,
    /// Overlay widget kept across sessions so a stop can still surface its
    /// "Stopping" notice after the session that owned the widget is gone.
    parked_overlay: Option<Box<dyn OverlayDialog>>,
}

impl Worker {
    async fn run(mut self) {
        debug!("Progress worker running");

        'serve: loop {
            // Idle: poll for a session label.
            let label0 = loop {
                if self.halted() {
                    break 'serve;
                }
                if let Some(label) = self.state.label() {
                    break label;
                }
                self.tick(self.config.idle_tick()).await;
            };

            // A fresh session must not inherit the previous one's verdict.
            self.state.clear_cancel();
            info!(label = %label0, "Progress session started");

            let mut target = self.select_target(&label0).await;
            debug!(target = target.describe(), "Presentation target selected");

            // Everything this session has shown so far; the baseline for
            // change detection and, at drain time, the amount to subtract
            // from the shared counters.
            let mut seen = Snapshot {
                label: Some(label0),
                file_total: 0,
                file_done: 0,
                unit_total: 0,
                unit_done: 0,
            };

            // Active: poll, coalesce, push.
            loop {
                if self.halted() {
                    break;
                }

                let current = self.state.snapshot();
                if current.differs_from(&seen) {
                    seen = current;

                    let Some(label) = seen.label.clone() else {
                        // Label cleared: session complete, fall out to drain.
                        break;
                    };

                    if target.is_messages() {
                        if self.config.show_work_hints {
                            if let Some(notices) = &self.env.notices {
                                notices.show_work_hint();
                            }
                        }
                    } else {
                        let report = ProgressReport::from_snapshot(&seen);
                        trace!(percent = report.percent, status = %report.status, "Pushing progress update");
                        target.push_report(&self.dispatcher, &label, report);
                    }
                }

                if target.is_messages() {
                    // Long CPU-bound batches can starve the notice queue;
                    // pump it on every tick, changed or not.
                    if let Some(notices) = &self.env.notices {
                        notices.refresh();
                    }
                }

                self.tick(self.config.update_tick()).await;
            }

            if self.halted() {
                // Leave the surface as-is; stop() releases the counters.
                self.parked_overlay = target.into_overlay();
                break 'serve;
            }

            // Drain: dismiss the surface and hand back this session's
            // contribution so overlapping sessions keep their own.
            self.parked_overlay = target.close(&self.dispatcher);
            self.state.session_cleanup(&seen);
            info!("Progress session finished");
        }

        if self.state.stop_requested() {
            if let Some(overlay) = self.parked_overlay.as_mut() {
                overlay.set_text("Stopping. Please wait...");
                overlay.refresh();
            }
        }
        debug!("Progress worker exited");
    }

    /// Pick the surface for a new session.
    ///
    /// Order: forced message-only, then the in-process overlay, then a host
    /// dialog, then message-only as the floor. The renderer wait runs first
    /// regardless, so surfaces that depend on it get a fair chance.
    async fn select_target(&mut self, label: &Arc<str>) -> ActiveTarget {
        if let Some(renderer) = &self.env.renderer {
            // Some backends initialize lazily; give them a bounded window.
            if timeout(self.config.renderer_wait(), renderer.ready())
                .await
                .is_err()
            {
                warn!("Renderer not ready in time, selecting a target without it");
            }
        }

        if self.config.force_message_only {
            return ActiveTarget::Messages;
        }

        if let Some(host) = &self.env.overlay {
            if let Some(mut overlay) = host.create_progress_dialog(DialogOptions::overlay(), label)
            {
                overlay.bar_set_message(0, "Please wait");
                return ActiveTarget::Overlay(overlay);
            }
        }

        if let Some(factory) = &self.env.dialogs {
            let dialog = factory.create_dialog(DialogOptions::fallback(), self.close_handler());
            let opened = dialog.clone();
            let title = label.clone();
            self.dispatcher.dispatch(move || opened.open(&title, &title));
            return ActiveTarget::Dialog(dialog);
        }

        ActiveTarget::Messages
    }

    /// Handler for the fallback dialog's close callback. A user dismissal
    /// asks the host to shut down and latches the cancel flag; programmatic
    /// closes pass through untouched.
    fn close_handler(&self) -> CloseHandler {
        let dispatcher = self.dispatcher.clone();
        let exit = self.env.exit.clone();
        let state = self.state.clone();
        Box::new(move |status| {
            if status != CloseStatus::Canceled {
                return;
            }
            let exit = exit.clone();
            dispatcher.dispatch(move || {
                info!("Aborted progress dialog");
                if let Some(exit) = &exit {
                    exit.request_exit();
                }
            });
            state.request_cancel();
        })
    }

    fn halted(&self) -> bool {
        self.state.stop_requested() || self.env.is_aborting()
    }

    /// Sleep for one poll period, or less if a stop request arrives.
    ///
    /// `&mut self` keeps the worker future `Send`: a `&Worker` held across
    /// this await would require `Sync`, and the parked overlay widget is
    /// `Send`-only.
    async fn tick(&mut self, period: Duration) {
        let _ = timeout(period, self.stop_wake.notified()).await;
    }
}
