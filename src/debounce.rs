// Trailing-edge debouncer backed by a single owned tokio timer task

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

// Runs only the most recently scheduled action, once no new action has been
// scheduled for `window`.
//
// Each debouncer owns its timer; two debouncers never cancel each other.
// Dropping the debouncer cancels a pending trigger. An action that already
// fired runs to completion on its own task and is not aborted by later
// `schedule` or `cancel` calls.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    // Must be called from within a tokio runtime
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(action);
        });

        if let Some(previous) = self.pending.lock().replace(timer) {
            if !previous.is_finished() {
                debug!("Restarting debounce window");
            }
            previous.abort();
        }
    }

    // Returns true if a trigger was still waiting
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(timer) => {
                let was_pending = !timer.is_finished();
                timer.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map_or(false, |timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.get_mut().take() {
            timer.abort();
        }
    }
}
