//! Repeating tasks and cooperative cancellation.
//!
//! Every generator runs as a [`RepeatingTask`] inside a session's [`TaskSet`].
//! A task is due at a time on the session's context clock; when it runs it
//! returns the delay to its next run. Tasks never preempt each other, so a
//! [`CancellationToken`] checked before every run is enough to stop them.

use crate::generators::{GenContext, Generator, Layer};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shortest delay a task may ask for, in seconds.
pub const MIN_TASK_DELAY: f64 = 0.001;

/// Shared cancellation flag.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag every clone of this token as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Handle of a task within its [`TaskSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// A generator scheduled to run repeatedly.
pub struct RepeatingTask {
    generator: Box<dyn Generator>,
    token: CancellationToken,
    due: f64,
    runs: u64,
}

impl RepeatingTask {
    /// Which layer this task drives.
    pub fn layer(&self) -> Layer {
        self.generator.layer()
    }

    /// Context time of the next run.
    pub fn due(&self) -> f64 {
        self.due
    }

    /// How many times the task has run.
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

/// The set of pending tasks owned by one session.
#[derive(Default)]
pub struct TaskSet {
    tasks: BTreeMap<TaskId, RepeatingTask>,
    next_id: u64,
}

impl std::fmt::Debug for TaskSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSet")
            .field("pending", &self.tasks.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `generator` to first run at `due`.
    pub fn spawn(
        &mut self,
        generator: Box<dyn Generator>,
        token: CancellationToken,
        due: f64,
    ) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        log::trace!("Task {:?} ({}) due at {:.3}s", id, generator.layer(), due);
        self.tasks.insert(
            id,
            RepeatingTask {
                generator,
                token,
                due,
                runs: 0,
            },
        );
        id
    }

    /// Remove one task. Returns whether it was pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    /// Remove every task. Returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a pending task.
    pub fn get(&self, id: TaskId) -> Option<&RepeatingTask> {
        self.tasks.get(&id)
    }

    /// Iterate over pending tasks.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &RepeatingTask)> {
        self.tasks.iter().map(|(&id, task)| (id, task))
    }

    /// Earliest due time among pending tasks.
    pub fn next_due(&self) -> Option<f64> {
        self.tasks.values().map(|t| t.due).reduce(f64::min)
    }

    /// Run every task due at or before `now`, in due order.
    ///
    /// A task whose token has been cancelled is dropped without running.
    /// Returns the number of tasks that ran.
    pub fn run_due(&mut self, now: f64, cx: &mut GenContext<'_>) -> usize {
        let mut due: Vec<(f64, TaskId)> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due <= now)
            .map(|(&id, task)| (task.due, id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut ran = 0;
        for (_, id) in due {
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };
            if task.token.is_cancelled() {
                log::trace!("Task {:?} ({}) cancelled before running", id, task.layer());
                self.tasks.remove(&id);
                continue;
            }

            ran += 1;
            task.runs += 1;
            match task.generator.tick(cx) {
                Ok(Some(delay)) => task.due = now + delay.max(MIN_TASK_DELAY),
                Ok(None) => {
                    log::debug!("Task {:?} ({}) finished", id, task.layer());
                    self.tasks.remove(&id);
                }
                Err(e) => {
                    log::warn!("Retiring {} task after error: {}", task.layer(), e);
                    self.tasks.remove(&id);
                }
            }
        }
        ran
    }
}
