//! sortgate: a bounded pool of tasks racing to insert lines into one sorted list.
//!
//! ```text
//! LineReader → Driver ─┬─ worker ─┐
//!                      ├─ worker ─┼─ Gate ─ SortedList → report
//!                      └─ worker ─┘
//! ```

mod error;
mod gate;
mod list;
mod reader;
mod record;
mod report;

pub mod driver;

pub use driver::{Driver, DriverSettings, DriverState, RunSummary, sort_records};
pub use error::{SortError, TaskError};
pub use gate::{GATE_PERMITS, Gate, GateGuard, GateStats};
pub use list::{Iter, ListNode, SortedList};
pub use reader::{LineReader, LineSource, ReaderSettings};
pub use record::StringRecord;
pub use report::{RESULT_BANNER, ReportFormat, STARTED_BANNER, write_report};
pub use sortgate_core::{Config, FailurePolicy, MAX_WORKERS};
