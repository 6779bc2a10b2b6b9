//! Concurrency stress tests: full worker pool, adversarial arrival order, failing gate.

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use sortgate_core::{FailurePolicy, MAX_WORKERS};

  use crate::{
    driver::{
      __tests__::helpers::{fast_settings, skip_settings, varied_lines},
      await_workers,
      barrier::JoinBarrier,
      sort_into, sort_records,
    },
    error::{SortError, TaskError},
    gate::Gate,
    list::SortedList,
    record::StringRecord,
  };

  #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
  async fn test_full_pool_of_varied_lengths() {
    let lines = varied_lines(MAX_WORKERS);
    let records: Vec<StringRecord> = lines.iter().map(|l| StringRecord::from(l.as_str())).collect();

    let (list, summary) = sort_records(records, &fast_settings()).await.unwrap();

    let mut expected = lines.clone();
    expected.sort();
    let actual: Vec<String> = list.iter().map(|r| r.to_string()).collect();
    assert_eq!(actual, expected);
    assert_eq!(list.len(), MAX_WORKERS);
    assert!(list.is_sorted());
    assert_eq!(summary.inserted, MAX_WORKERS);
    assert_eq!(summary.dropped, 0);
    assert_eq!(summary.gate.peak_holders, 1, "two workers were inside the gate at once");
    assert_eq!(summary.gate.acquisitions, MAX_WORKERS);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
  async fn test_repeated_runs_converge_to_same_order() {
    let lines = varied_lines(40);
    let mut outputs = Vec::new();
    for _ in 0..5 {
      let records = lines.iter().map(|l| StringRecord::from(l.as_str())).collect();
      let (list, _) = sort_records(records, &fast_settings()).await.unwrap();
      outputs.push(list.iter().map(|r| r.to_string()).collect::<Vec<_>>());
    }
    assert!(outputs.windows(2).all(|pair| pair[0] == pair[1]));
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_closed_gate_aborts_by_default() {
    let gate = Arc::new(Gate::new(SortedList::new()));
    gate.close();
    let records = varied_lines(10).into_iter().map(StringRecord::from).collect();

    let settings = fast_settings();
    assert_eq!(settings.on_failure, FailurePolicy::Abort);
    let err = sort_into(gate, records, &settings).await.unwrap_err();
    assert!(matches!(err, SortError::SyncPrimitive { .. }));
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_closed_gate_with_skip_drops_every_line() {
    let gate = Arc::new(Gate::new(SortedList::new()));
    gate.close();
    let records = varied_lines(10).into_iter().map(StringRecord::from).collect();

    let (list, summary) = sort_into(gate, records, &skip_settings()).await.unwrap();
    assert!(list.is_empty());
    assert_eq!(summary.accepted, 10);
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.dropped, 10);
    assert_eq!(summary.inserted + summary.dropped, summary.accepted);
  }

  async fn panicking_worker(delay: Duration) -> Result<(), SortError> {
    tokio::time::sleep(delay).await;
    panic!("worker died mid-run")
  }

  /// Two healthy workers around one that panics.
  fn barrier_with_panicking_worker() -> JoinBarrier<Result<(), SortError>> {
    let mut barrier = JoinBarrier::new(3);
    barrier.spawn(async { Ok(()) }).unwrap();
    barrier.spawn(panicking_worker(Duration::ZERO)).unwrap();
    barrier.spawn(async { Ok(()) }).unwrap();
    barrier
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_panicked_worker_is_fatal_under_every_policy() {
    for policy in [FailurePolicy::Abort, FailurePolicy::Skip] {
      let err = await_workers(barrier_with_panicking_worker(), policy)
        .await
        .unwrap_err();

      match err {
        SortError::Task {
          op: "join worker",
          source: TaskError::Join(join),
        } => assert!(join.is_panic(), "{policy:?}: expected a panic"),
        other => panic!("{policy:?}: expected a join failure, got {other:?}"),
      }
    }
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_skip_absorbs_clean_failures_but_not_panics() {
    let mut barrier = JoinBarrier::new(2);
    barrier
      .spawn(async { Err(SortError::allocation("copy record", 8)) })
      .unwrap();
    barrier.spawn(panicking_worker(Duration::from_millis(20))).unwrap();

    let err = await_workers(barrier, FailurePolicy::Skip).await.unwrap_err();
    assert!(matches!(
      err,
      SortError::Task {
        op: "join worker",
        source: TaskError::Join(_)
      }
    ));
  }
}
