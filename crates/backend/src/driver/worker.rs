//! A single insertion task.

use std::{sync::Arc, time::Duration};

use tracing::{debug, trace};

use crate::{
  error::SortError,
  gate::Gate,
  list::{ListNode, SortedList},
  record::StringRecord,
};

/// Simulated processing time: `per_byte` for every byte of the record, saturating.
pub(crate) fn latency_for(record: &StringRecord, per_byte: Duration) -> Duration {
  let bytes = u32::try_from(record.len()).unwrap_or(u32::MAX);
  per_byte.saturating_mul(bytes)
}

/// Sleep in proportion to the record's length, then insert it under the gate.
///
/// Longer records arrive at the gate later, so spawn order says nothing about
/// the order in which workers contend for it.
pub(crate) async fn insert_record(
  index: usize,
  record: StringRecord,
  gate: Arc<Gate<SortedList>>,
  per_byte: Duration,
) -> Result<(), SortError> {
  let latency = latency_for(&record, per_byte);
  trace!(index, bytes = record.len(), ?latency, "worker started");
  if !latency.is_zero() {
    tokio::time::sleep(latency).await;
  }

  let node = ListNode::new(record);
  let mut list = gate.acquire().await.inspect_err(|e| {
    debug!(index, error = %e, "worker could not enter the gate");
  })?;
  list.insert_node(node);
  trace!(index, len = list.len(), "worker inserted");

  Ok(())
}
