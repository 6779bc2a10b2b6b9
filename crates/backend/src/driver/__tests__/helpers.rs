//! Test helpers for driver tests.
//!
//! Runs the driver over in-memory streams and hands back everything it wrote.

use std::{io::Cursor, time::Duration};

use sortgate_core::FailurePolicy;

use crate::{
  driver::{Driver, DriverSettings, DriverState, RunSummary},
  error::SortError,
  reader::{LineReader, ReaderSettings},
  record::StringRecord,
  report::ReportFormat,
};

/// Settings with a short per-byte delay so tests stay fast.
pub fn fast_settings() -> DriverSettings {
  DriverSettings {
    delay_per_byte: Duration::from_micros(200),
    ..Default::default()
  }
}

pub fn skip_settings() -> DriverSettings {
  DriverSettings {
    on_failure: FailurePolicy::Skip,
    ..fast_settings()
  }
}

/// Output of one driver run over an in-memory stdin.
pub struct RunOutput {
  pub prompts: String,
  pub stdout: String,
  pub state: DriverState,
  pub result: Result<RunSummary, SortError>,
}

pub async fn run_with_input(input: &str, settings: DriverSettings) -> RunOutput {
  let mut source = LineReader::new(
    Cursor::new(input.as_bytes().to_vec()),
    Vec::new(),
    ReaderSettings::default(),
  );
  let mut out = Vec::new();
  let mut driver = Driver::new(settings);
  let result = driver.run(&mut source, &mut out).await;

  let (_, prompts) = source.into_inner();
  RunOutput {
    prompts: String::from_utf8(prompts).expect("prompts are utf-8"),
    stdout: String::from_utf8(out).expect("report is utf-8"),
    state: driver.state(),
    result,
  }
}

pub async fn run_json(input: &str) -> RunOutput {
  run_with_input(
    input,
    DriverSettings {
      format: ReportFormat::Json,
      ..fast_settings()
    },
  )
  .await
}

pub fn records(words: &[&str]) -> Vec<StringRecord> {
  words.iter().map(|w| StringRecord::from(*w)).collect()
}

/// Deterministically scrambled lines of length 1..=count, each starting with a distinct letter mix.
pub fn varied_lines(count: usize) -> Vec<String> {
  (0..count)
    .map(|i| {
      let len = (i * 37) % count + 1;
      let letter = (b'a' + ((i * 11) % 26) as u8) as char;
      std::iter::repeat_n(letter, len).collect()
    })
    .collect()
}
