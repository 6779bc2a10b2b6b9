//! Join-all barrier over a bounded set of worker tasks.

use std::future::Future;

use tokio::task::JoinSet;
use tracing::trace;

use crate::error::TaskError;

/// Counts completions against the number of spawned workers.
#[derive(Debug, Default)]
struct DoneTracker {
  expected: usize,
  received: usize,
}

impl DoneTracker {
  /// Record a completion. Returns true if this was the last one.
  fn record_done(&mut self) -> bool {
    self.received += 1;
    self.received >= self.expected
  }

  fn is_complete(&self) -> bool {
    self.received == self.expected
  }
}

/// Spawns up to `capacity` tasks and waits for all of them, in whatever order they finish.
pub(crate) struct JoinBarrier<T> {
  tasks: JoinSet<T>,
  capacity: usize,
  tracker: DoneTracker,
}

impl<T: Send + 'static> JoinBarrier<T> {
  pub(crate) fn new(capacity: usize) -> Self {
    Self {
      tasks: JoinSet::new(),
      capacity,
      tracker: DoneTracker::default(),
    }
  }

  pub(crate) fn spawn<F>(&mut self, task: F) -> Result<(), TaskError>
  where
    F: Future<Output = T> + Send + 'static,
  {
    if self.tracker.expected >= self.capacity {
      return Err(TaskError::OverCapacity {
        requested: self.tracker.expected + 1,
        capacity: self.capacity,
      });
    }
    self.tasks.spawn(task);
    self.tracker.expected += 1;
    Ok(())
  }

  pub(crate) fn spawned(&self) -> usize {
    self.tracker.expected
  }

  /// Wait for the next task to finish. `None` once every task has been joined.
  pub(crate) async fn join_next(&mut self) -> Option<Result<T, TaskError>> {
    let joined = self.tasks.join_next().await?;
    if self.tracker.record_done() {
      debug_assert!(self.tasks.is_empty(), "tasks left after the last expected join");
      trace!(joined = self.tracker.received, "last worker joined");
    }
    Some(joined.map_err(TaskError::from))
  }

  /// Confirm every spawned task was joined.
  pub(crate) fn finish(self) -> Result<usize, TaskError> {
    if self.tracker.is_complete() {
      Ok(self.tracker.received)
    } else {
      Err(TaskError::Incomplete {
        spawned: self.tracker.expected,
        joined: self.tracker.received,
      })
    }
  }
}
