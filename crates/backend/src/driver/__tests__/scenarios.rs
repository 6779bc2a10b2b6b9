//! End-to-end driver scenarios over in-memory input.

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use crate::{
    driver::{
      Driver, DriverState,
      __tests__::helpers::{fast_settings, records, run_json, run_with_input},
      sort_records,
    },
    error::{SortError, TaskError},
    reader::LineSource,
  };

  // ==========================================================================
  // Text output
  // ==========================================================================

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_sorts_three_fruits() {
    let run = run_with_input("banana\napple\ncherry\nstop!\n", fast_settings()).await;
    let summary = run.result.expect("run should succeed");

    assert_eq!(
      run.stdout,
      "sorting started...\nsorting result:\napple\nbanana\ncherry\n"
    );
    assert_eq!(run.prompts, "1: 2: 3: 4: ");
    assert_eq!(summary.accepted, 3);
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.dropped, 0);
    assert_eq!(summary.gate.peak_holders, 1);
    assert_eq!(run.state, DriverState::Done);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_duplicates_are_kept() {
    let run = run_with_input("same\nsame\nstop!\n", fast_settings()).await;
    run.result.expect("run should succeed");
    assert_eq!(run.stdout, "sorting started...\nsorting result:\nsame\nsame\n");
  }

  #[tokio::test]
  async fn test_sentinel_only_prints_empty_result() {
    let run = run_with_input("stop!\n", fast_settings()).await;
    let summary = run.result.expect("run should succeed");

    assert_eq!(run.stdout, "sorting started...\nsorting result:\n");
    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.gate.acquisitions, 0);
    assert_eq!(run.state, DriverState::Done);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
  async fn test_empty_lines_sort_first() {
    let run = run_with_input("b\n\na\nstop!\n", fast_settings()).await;
    run.result.expect("run should succeed");
    assert_eq!(run.stdout, "sorting started...\nsorting result:\n\na\nb\n");
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
  async fn test_json_report() {
    let run = run_json("pear\nfig\nstop!\n").await;
    run.result.expect("run should succeed");

    let value: serde_json::Value = serde_json::from_str(&run.stdout).expect("stdout is one JSON document");
    assert_eq!(value["sorted"], serde_json::json!(["fig", "pear"]));
    assert_eq!(value["accepted"], 2);
  }

  // ==========================================================================
  // Failures
  // ==========================================================================

  #[tokio::test]
  async fn test_input_ending_early_stops_in_reading() {
    let run = run_with_input("apple\nbanana\n", fast_settings()).await;

    assert!(matches!(run.result, Err(SortError::Io { op: "read line", .. })));
    assert_eq!(run.state, DriverState::Reading);
    assert_eq!(run.stdout, "", "nothing is printed after a read failure");
  }

  #[tokio::test]
  async fn test_source_over_capacity_spawns_nothing() {
    let mut settings = fast_settings();
    settings.capacity = 2;
    let mut source = records(&["a", "b", "c"]);
    let mut out = Vec::new();

    let mut driver = Driver::new(settings);
    let err = driver.run(&mut source, &mut out).await.unwrap_err();

    assert!(matches!(
      err,
      SortError::Task {
        source: TaskError::OverCapacity {
          requested: 3,
          capacity: 2
        },
        ..
      }
    ));
    assert_eq!(driver.state(), DriverState::Spawning);
  }

  #[tokio::test]
  async fn test_dyn_line_source() {
    let mut source: Box<dyn LineSource> = Box::new(records(&["y", "x"]));
    let mut out = Vec::new();
    Driver::new(fast_settings())
      .run(source.as_mut(), &mut out)
      .await
      .expect("run should succeed");
    assert!(String::from_utf8(out).unwrap().ends_with("sorting result:\nx\ny\n"));
  }

  // ==========================================================================
  // Library entry point
  // ==========================================================================

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_sort_records_without_io() {
    let (list, summary) = sort_records(records(&["delta", "alpha", "charlie", "bravo"]), &fast_settings())
      .await
      .unwrap();

    let sorted: Vec<String> = list.iter().map(|r| r.to_string()).collect();
    assert_eq!(sorted, vec!["alpha", "bravo", "charlie", "delta"]);
    assert_eq!(summary.inserted, 4);
    assert_eq!(summary.gate.acquisitions, 4);
  }
}
