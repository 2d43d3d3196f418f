//! Fire-and-forget marshaling of UI work onto the host's UI context.
//!
//! Host dialog backends are typically bound to a single thread or event
//! loop. The server never calls them directly; it packages each update as a
//! closure and posts it through a [`UiDispatcher`]. Posting never blocks and
//! never waits for execution — a slow or stalled UI cannot stall the worker.

use tokio::sync::mpsc;
use tracing::trace;

type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Sending half: cheap to clone, safe to call from any thread.
#[derive(Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<UiTask>,
}

/// Receiving half, owned by whichever context plays the role of UI thread.
pub struct UiDispatchQueue {
    rx: mpsc::UnboundedReceiver<UiTask>,
}

impl UiDispatcher {
    /// Create a dispatcher and the queue that will execute its tasks.
    pub fn channel() -> (Self, UiDispatchQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UiDispatchQueue { rx })
    }

    /// Post a closure for later execution on the UI context.
    ///
    /// Returns immediately. If the queue has already been dropped the task is
    /// silently discarded; late updates during teardown are expected and
    /// harmless.
    pub fn dispatch(&self, task: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(task)).is_err() {
            trace!("ui queue closed, dropping dispatched task");
        }
    }
}

impl UiDispatchQueue {
    /// Run queued tasks until every dispatcher has been dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
    }

    /// Execute everything currently queued without waiting for more.
    ///
    /// Returns the number of tasks run. Lets tests (and simple single-thread
    /// hosts) pump the queue at points of their choosing.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dispatch_returns_before_execution() {
        let (dispatcher, mut queue) = UiDispatcher::channel();
        let hits = Arc::new(AtomicUsize::new(0));

        let task_hits = hits.clone();
        dispatcher.dispatch(move || {
            task_hits.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tasks_run_in_dispatch_order() {
        let (dispatcher, mut queue) = UiDispatcher::channel();
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        for i in 0..5 {
            let log = log.clone();
            dispatcher.dispatch(move || log.lock().unwrap().push(i));
        }

        assert_eq!(queue.run_pending(), 5);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn dispatch_after_queue_dropped_is_silent() {
        let (dispatcher, queue) = UiDispatcher::channel();
        drop(queue);
        dispatcher.dispatch(|| panic!("must never run"));
    }

    #[tokio::test]
    async fn run_drains_until_senders_close() {
        let (dispatcher, queue) = UiDispatcher::channel();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let task_hits = hits.clone();
            dispatcher.dispatch(move || {
                task_hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        drop(dispatcher);

        queue.run().await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
