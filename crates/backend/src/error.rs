//! Error types for the sorting pipeline.
//!
//! Every variant names the operation that failed so the binary can print a
//! single diagnostic line. None of them are retried.

use tokio::{sync::AcquireError, task::JoinError};

/// Errors raised while reading, sorting or reporting.
#[derive(Debug, thiserror::Error)]
pub enum SortError {
  /// The line source or the output stream failed.
  #[error("{op}: {source}")]
  Io {
    op: &'static str,
    #[source]
    source: std::io::Error,
  },
  /// A buffer or record could not be allocated.
  #[error("{op}: cannot allocate {requested} bytes")]
  Allocation { op: &'static str, requested: usize },
  /// The gate refused an acquisition.
  #[error("{op}: {source}")]
  SyncPrimitive {
    op: &'static str,
    #[source]
    source: AcquireError,
  },
  /// A worker task could not be spawned, joined or accounted for.
  #[error("{op}: {source}")]
  Task {
    op: &'static str,
    #[source]
    source: TaskError,
  },
}

impl SortError {
  pub fn io(op: &'static str, source: std::io::Error) -> Self {
    Self::Io { op, source }
  }

  pub fn allocation(op: &'static str, requested: usize) -> Self {
    Self::Allocation { op, requested }
  }

  pub fn task(op: &'static str, source: TaskError) -> Self {
    Self::Task { op, source }
  }

  /// Short label for structured logs.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Io { .. } => "io",
      Self::Allocation { .. } => "allocation",
      Self::SyncPrimitive { .. } => "sync_primitive",
      Self::Task { .. } => "task",
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
  #[error("{requested} workers requested but the pool holds at most {capacity}")]
  OverCapacity { requested: usize, capacity: usize },
  #[error(transparent)]
  Join(#[from] JoinError),
  #[error("joined {joined} of {spawned} workers")]
  Incomplete { spawned: usize, joined: usize },
  #[error("list is still shared by {holders} references")]
  Outstanding { holders: usize },
}
