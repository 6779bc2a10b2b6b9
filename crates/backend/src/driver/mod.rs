//! Worker Pool Driver
//!
//! Reads every line first, then fans out one task per line. Each task sleeps
//! in proportion to its line's length, enters the gate and inserts its line
//! into the shared list. The driver waits for all tasks before reading the list.
//!
//! ```text
//! Idle → Reading → Spawning → Awaiting → Reporting → Done
//! ```
//!
//! The list lives inside the gate while workers run. Once every worker has
//! been joined the driver takes the list back out, so reporting cannot race
//! with an insertion.

mod barrier;
mod worker;


use std::{io::Write, sync::Arc, time::Duration};

use sortgate_core::{Config, FailurePolicy, MAX_WORKERS};
use tracing::{debug, error, info, warn};

use self::{barrier::JoinBarrier, worker::insert_record};
use crate::{
  error::{SortError, TaskError},
  gate::{Gate, GateStats},
  list::SortedList,
  reader::LineSource,
  record::StringRecord,
  report::{ReportFormat, STARTED_BANNER, write_report},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
  Idle,
  Reading,
  Spawning,
  Awaiting,
  Reporting,
  Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
  /// Most workers a single run may spawn (at most MAX_WORKERS)
  pub capacity: usize,
  /// Worker delay per byte of its record
  pub delay_per_byte: Duration,
  /// What a worker failure before insertion does to the run
  pub on_failure: FailurePolicy,
  pub format: ReportFormat,
}

impl DriverSettings {
  pub fn from_config(config: &Config) -> Self {
    Self {
      capacity: config.input.max_lines.min(MAX_WORKERS),
      delay_per_byte: Duration::from_millis(config.workers.delay_per_byte_ms),
      on_failure: config.workers.on_failure,
      format: ReportFormat::default(),
    }
  }
}

impl Default for DriverSettings {
  fn default() -> Self {
    Self::from_config(&Config::default())
  }
}

/// Counts from a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  /// Lines handed over by the line source
  pub accepted: usize,
  /// Lines that made it into the list
  pub inserted: usize,
  /// Lines whose worker failed under [`FailurePolicy::Skip`]
  pub dropped: usize,
  pub gate: GateStats,
}

#[derive(Debug, Default)]
struct WorkerCounts {
  inserted: usize,
  dropped: usize,
}

pub struct Driver {
  settings: DriverSettings,
  state: DriverState,
}

impl Driver {
  pub fn new(settings: DriverSettings) -> Self {
    Self {
      settings,
      state: DriverState::Idle,
    }
  }

  pub fn state(&self) -> DriverState {
    self.state
  }

  fn transition(&mut self, next: DriverState) {
    debug!(from = ?self.state, to = ?next, "driver state");
    self.state = next;
  }

  /// Read, sort and report. Any error ends the run where it happened.
  ///
  /// `source` is read on the calling task. A source that blocks on a terminal
  /// or pipe should be drained with `spawn_blocking` first and passed in as a
  /// `Vec<StringRecord>`. The started banner is only written for text reports,
  /// so a JSON report is the whole of `out`.
  pub async fn run<S, W>(&mut self, source: &mut S, out: &mut W) -> Result<RunSummary, SortError>
  where
    S: LineSource + ?Sized,
    W: Write,
  {
    self.transition(DriverState::Reading);
    let records = source.read_lines()?;
    if self.settings.format == ReportFormat::Text {
      out
        .write_all(STARTED_BANNER.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| SortError::io("write banner", e))?;
    }

    self.transition(DriverState::Spawning);
    let accepted = records.len();
    info!(accepted, "sorting started");
    let gate = Arc::new(Gate::new(SortedList::new()));
    let barrier = spawn_workers(&gate, records, &self.settings)?;

    self.transition(DriverState::Awaiting);
    let counts = await_workers(barrier, self.settings.on_failure).await?;

    self.transition(DriverState::Reporting);
    let (list, summary) = reclaim(gate, accepted, counts)?;
    write_report(out, &list, &summary, self.settings.format)?;
    drop(list);

    self.transition(DriverState::Done);
    info!(
      accepted = summary.accepted,
      inserted = summary.inserted,
      dropped = summary.dropped,
      "sorting finished"
    );
    Ok(summary)
  }
}

/// Insert `records` concurrently and return the finished list. No I/O.
pub async fn sort_records(
  records: Vec<StringRecord>,
  settings: &DriverSettings,
) -> Result<(SortedList, RunSummary), SortError> {
  sort_into(Arc::new(Gate::new(SortedList::new())), records, settings).await
}

async fn sort_into(
  gate: Arc<Gate<SortedList>>,
  records: Vec<StringRecord>,
  settings: &DriverSettings,
) -> Result<(SortedList, RunSummary), SortError> {
  let accepted = records.len();
  let barrier = spawn_workers(&gate, records, settings)?;
  let counts = await_workers(barrier, settings.on_failure).await?;
  reclaim(gate, accepted, counts)
}

/// Spawn one worker per record, or none at all if they would not fit.
fn spawn_workers(
  gate: &Arc<Gate<SortedList>>,
  records: Vec<StringRecord>,
  settings: &DriverSettings,
) -> Result<JoinBarrier<Result<(), SortError>>, SortError> {
  let capacity = settings.capacity.min(MAX_WORKERS);
  if records.len() > capacity {
    return Err(SortError::task(
      "spawn workers",
      TaskError::OverCapacity {
        requested: records.len(),
        capacity,
      },
    ));
  }

  let mut barrier = JoinBarrier::new(capacity);
  for (index, record) in records.into_iter().enumerate() {
    barrier
      .spawn(insert_record(index, record, gate.clone(), settings.delay_per_byte))
      .map_err(|e| SortError::task("spawn worker", e))?;
  }
  debug!(workers = barrier.spawned(), "workers spawned");
  Ok(barrier)
}

/// Join every worker, in completion order.
async fn await_workers(
  mut barrier: JoinBarrier<Result<(), SortError>>,
  policy: FailurePolicy,
) -> Result<WorkerCounts, SortError> {
  let mut counts = WorkerCounts::default();

  while let Some(joined) = barrier.join_next().await {
    match joined {
      Ok(Ok(())) => counts.inserted += 1,
      Ok(Err(e)) => match policy {
        FailurePolicy::Abort => {
          error!(kind = e.kind(), error = %e, "worker failed, aborting run");
          return Err(e);
        }
        FailurePolicy::Skip => {
          warn!(kind = e.kind(), error = %e, "worker failed, dropping its line");
          counts.dropped += 1;
        }
      },
      Err(e) => {
        error!(error = %e, "worker could not be joined");
        return Err(SortError::task("join worker", e));
      }
    }
  }

  let joined = barrier.finish().map_err(|e| SortError::task("join workers", e))?;
  debug!(joined, inserted = counts.inserted, dropped = counts.dropped, "all workers joined");
  Ok(counts)
}

/// Take the list back out of the gate once no worker holds a reference to it.
fn reclaim(
  gate: Arc<Gate<SortedList>>,
  accepted: usize,
  counts: WorkerCounts,
) -> Result<(SortedList, RunSummary), SortError> {
  let gate = Arc::try_unwrap(gate).map_err(|gate| {
    SortError::task(
      "reclaim list",
      TaskError::Outstanding {
        holders: Arc::strong_count(&gate) - 1,
      },
    )
  })?;

  let summary = RunSummary {
    accepted,
    inserted: counts.inserted,
    dropped: counts.dropped,
    gate: gate.stats(),
  };
  let list = gate.into_inner();
  debug_assert!(list.is_sorted());
  debug_assert_eq!(list.len(), summary.inserted);
  Ok((list, summary))
}
