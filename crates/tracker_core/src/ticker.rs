//! Periodic re-evaluation of the routine's current task.
//!
//! The ticker owns a background thread that runs its callback once at start,
//! then every `period`, and immediately after `refresh`. Dropping the ticker
//! stops and joins the thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::calendar::Clock;
use crate::routine::{RoutineItem, RoutinePlanner};

/// Period of the routine highlight refresh.
pub const DEFAULT_TICK: Duration = Duration::from_secs(60);

#[derive(Default)]
struct TickState {
    stopped: bool,
    refresh_requested: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<TickState>,
    wake: Condvar,
}

pub struct RoutineTicker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl RoutineTicker {
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let worker = Arc::clone(&shared);
        let handle = thread::spawn(move || loop {
            on_tick();
            let mut state = worker.state.lock();
            if !state.stopped && !state.refresh_requested {
                worker.wake.wait_for(&mut state, period);
            }
            if state.stopped {
                break;
            }
            state.refresh_requested = false;
        });
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Evaluates the current task now and whenever the period elapses,
    /// calling `on_change` only when the task differs from the last one seen.
    pub fn watch_current_task<F>(
        planner: Arc<RoutinePlanner>,
        clock: Arc<dyn Clock>,
        period: Duration,
        mut on_change: F,
    ) -> Self
    where
        F: FnMut(Option<&RoutineItem>) + Send + 'static,
    {
        let mut last: Option<Option<RoutineItem>> = None;
        Self::spawn(period, move || {
            let current = planner.current_task_at(clock.now());
            if last.as_ref().map(Option::as_ref) != Some(current) {
                on_change(current);
                last = Some(current.cloned());
            }
        })
    }

    /// Requests an out-of-band evaluation, e.g. after a view switch.
    pub fn refresh(&self) {
        let mut state = self.shared.state.lock();
        state.refresh_requested = true;
        self.shared.wake.notify_one();
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.stopped = true;
            self.shared.wake.notify_one();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("routine ticker thread panicked");
            }
        }
    }
}

impl Drop for RoutineTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
