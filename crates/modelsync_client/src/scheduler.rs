//! Debounced scheduler ownership.

use tokio::task::JoinHandle;

/// Owns one scheduler task; aborting on drop is the teardown path.
///
/// A controller holds at most one guard per scheduler, so stopping,
/// restarting or dropping the controller always tears the previous timer
/// down with it.
pub(crate) struct SchedulerGuard {
    task: JoinHandle<()>,
}

impl SchedulerGuard {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }
}

impl Drop for SchedulerGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}
