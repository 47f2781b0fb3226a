//! Main-thread executor and cancellable timers.
//!
//! Accessibility and workspace mutations are made from tasks running on the
//! [`Executor`], never from an event tap callback. The one exception is the
//! resize picker session: window enumeration, thumbnail capture, app icons
//! and the blocking pickers run on [`Executor::spawn_background`], and only
//! the final mutation is dispatched back to the main thread.
//!
//! Delayed work returns a [`Timer`]. Controllers keep their timers in a
//! [`TimerGroup`] and cancel the whole group on stop. Work a controller queues
//! with plain [`Executor::dispatch`] goes through [`TimerGroup::bind`] so it
//! is dropped as well when the controller stops before it runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Single-threaded run-loop abstraction.
pub trait Executor: Send + Sync {
    /// Run `task` on the main thread as soon as possible.
    fn dispatch(&self, task: Task);

    /// Run `task` on the main thread after `delay` unless the returned timer
    /// is cancelled first.
    fn dispatch_after(&self, delay: Duration, task: Task) -> Timer;

    /// Run `task` off the main thread. Results come back via `dispatch`.
    fn spawn_background(&self, task: Task);

    fn is_main_thread(&self) -> bool;
}

/// Handle to a pending delayed task.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    cancelled: Arc<AtomicBool>,
}

impl Timer {
    /// Wrap `task` so it becomes a no-op once the returned timer is cancelled.
    pub fn guard(task: Task) -> (Timer, Task) {
        let timer = Timer::default();
        let flag = timer.cancelled.clone();
        let guarded: Task = Box::new(move || {
            if !flag.load(AtomicOrdering::SeqCst) {
                task();
            }
        });
        (timer, guarded)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

/// Snapshot of a [`TimerGroup`] generation.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.generation.load(AtomicOrdering::SeqCst) != self.issued
    }

    pub fn bind(self, task: Task) -> Task {
        Box::new(move || {
            if !self.is_cancelled() {
                task();
            }
        })
    }
}

/// Timers and queued tasks issued by one controller.
///
/// `cancel_all` bumps the group's generation; tasks bound under an older
/// generation become no-ops.
#[derive(Debug, Default)]
pub struct TimerGroup {
    timers: Mutex<Vec<Timer>>,
    generation: Arc<AtomicU64>,
}

impl TimerGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, timer: Timer) {
        let mut timers = self.timers.lock();
        timers.retain(|t| !t.is_cancelled());
        timers.push(timer);
    }

    /// Token that reports cancellation of everything issued before it.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            generation: self.generation.clone(),
            issued: self.generation.load(AtomicOrdering::SeqCst),
        }
    }

    /// Wrap `task` so it only runs if the group was not cancelled after this
    /// call.
    pub fn bind(&self, task: Task) -> Task {
        self.token().bind(task)
    }

    /// Cancel everything tracked or bound so far and return how many timers
    /// were still live.
    pub fn cancel_all(&self) -> usize {
        self.generation.fetch_add(1, AtomicOrdering::SeqCst);
        let timers: Vec<Timer> = self.timers.lock().drain(..).collect();
        let live = timers.iter().filter(|t| !t.is_cancelled()).count();
        for timer in &timers {
            timer.cancel();
        }
        live
    }

    pub fn len(&self) -> usize {
        self.timers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualExecutor;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Task) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move || {
            let c = c.clone();
            Box::new(move || {
                c.fetch_add(1, AtomicOrdering::SeqCst);
            })
        })
    }

    #[test]
    fn test_dispatch_runs_on_idle() {
        let exec = ManualExecutor::new();
        let (count, task) = counter();
        exec.dispatch(task());
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
        exec.run_until_idle();
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_after_waits_for_clock() {
        let exec = ManualExecutor::new();
        let (count, task) = counter();
        exec.dispatch_after(Duration::from_millis(250), task());

        exec.advance(Duration::from_millis(249));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
        exec.advance(Duration::from_millis(1));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(exec.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_cancelled_timer_never_runs() {
        let exec = ManualExecutor::new();
        let (count, task) = counter();
        let timer = exec.dispatch_after(Duration::from_millis(100), task());
        timer.cancel();
        exec.advance(Duration::from_secs(1));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_timer_group_cancels_all() {
        let exec = ManualExecutor::new();
        let group = TimerGroup::new();
        let (count, task) = counter();
        group.track(exec.dispatch_after(Duration::from_millis(10), task()));
        group.track(exec.dispatch_after(Duration::from_millis(20), task()));
        assert_eq!(group.cancel_all(), 2);
        assert!(group.is_empty());
        exec.advance(Duration::from_millis(50));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_bound_task_dropped_after_cancel() {
        let exec = ManualExecutor::new();
        let group = TimerGroup::new();
        let (count, task) = counter();
        exec.dispatch(group.bind(task()));
        group.cancel_all();
        exec.run_until_idle();
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);

        // binding after the cancel belongs to the new generation
        exec.dispatch(group.bind(task()));
        exec.run_until_idle();
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    }

    #[test]
    fn test_tasks_run_in_due_order() {
        let exec = ManualExecutor::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (label, delay) in [("late", 30u64), ("early", 10), ("mid", 20)] {
            let order = order.clone();
            exec.dispatch_after(
                Duration::from_millis(delay),
                Box::new(move || order.lock().push(label)),
            );
        }
        exec.advance(Duration::from_millis(30));
        assert_eq!(*order.lock(), vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_nested_delays_respect_virtual_time() {
        let exec = ManualExecutor::new();
        let (count, task) = counter();
        let inner = exec.clone();
        let t = task();
        exec.dispatch_after(
            Duration::from_millis(100),
            Box::new(move || {
                inner.dispatch_after(Duration::from_millis(100), t);
            }),
        );
        exec.advance(Duration::from_millis(150));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
        exec.advance(Duration::from_millis(50));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 1);
    }
}
