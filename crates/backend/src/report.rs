//! Rendering of the finished list.

use std::{borrow::Cow, io::Write};

use serde::Serialize;

use crate::{driver::RunSummary, error::SortError, list::SortedList};

/// Printed once reading is over, before any worker starts.
pub const STARTED_BANNER: &str = "sorting started...\n";
/// Printed before the sorted values in the text report.
pub const RESULT_BANNER: &str = "sorting result:\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
  /// Banner, then one raw value per line
  #[default]
  Text,
  /// A single JSON object on one line
  Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
  accepted: usize,
  dropped: usize,
  sorted: Vec<Cow<'a, str>>,
}

/// Write `list` to `out`. Read-only, so calling it twice prints the same thing twice.
pub fn write_report<W: Write>(
  out: &mut W,
  list: &SortedList,
  summary: &RunSummary,
  format: ReportFormat,
) -> Result<(), SortError> {
  let io_err = |e| SortError::io("write report", e);

  match format {
    ReportFormat::Text => {
      out.write_all(RESULT_BANNER.as_bytes()).map_err(io_err)?;
      for record in list {
        out.write_all(record.as_bytes()).map_err(io_err)?;
        out.write_all(b"\n").map_err(io_err)?;
      }
    }
    ReportFormat::Json => {
      let report = JsonReport {
        accepted: summary.accepted,
        dropped: summary.dropped,
        sorted: list.iter().map(|record| record.to_string_lossy()).collect(),
      };
      serde_json::to_writer(&mut *out, &report).map_err(|e| io_err(e.into()))?;
      out.write_all(b"\n").map_err(io_err)?;
    }
  }

  out.flush().map_err(io_err)
}
