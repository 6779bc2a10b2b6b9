//! Mutual-exclusion gate around a shared value.
//!
//! A counting semaphore initialised with a single permit. Holding the permit
//! is the only way to reach the protected value, so at most one task mutates
//! it at any instant. The value itself sits in a `Mutex` that is only locked
//! by the permit holder and is therefore never contended. The gate also counts
//! its holders so tests can check that the count never goes above one.

use std::{
  ops::{Deref, DerefMut},
  sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
};

use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::trace;

use crate::error::SortError;

/// Permits handed out by a [`Gate`]. Exclusive access depends on this being 1.
pub const GATE_PERMITS: usize = 1;

/// Counters collected by a [`Gate`] over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
  /// Largest number of simultaneous holders ever observed
  pub peak_holders: usize,
  /// Successful acquisitions
  pub acquisitions: usize,
}

pub struct Gate<T> {
  permits: Semaphore,
  holders: AtomicUsize,
  peak_holders: AtomicUsize,
  acquisitions: AtomicUsize,
  value: Mutex<T>,
}

impl<T> Gate<T> {
  pub fn new(value: T) -> Self {
    Self {
      permits: Semaphore::new(GATE_PERMITS),
      holders: AtomicUsize::new(0),
      peak_holders: AtomicUsize::new(0),
      acquisitions: AtomicUsize::new(0),
      value: Mutex::new(value),
    }
  }

  /// Wait for the permit, then take it.
  ///
  /// Waiters are not ordered; some waiter proceeds after each release.
  /// The guard is not `Send`, so it cannot be held across an `.await` in a spawned task.
  pub async fn acquire(&self) -> Result<GateGuard<'_, T>, SortError> {
    let permit = self
      .permits
      .acquire()
      .await
      .map_err(|source| SortError::SyncPrimitive {
        op: "gate acquire",
        source,
      })?;

    let holders = self.holders.fetch_add(1, Ordering::AcqRel) + 1;
    self.peak_holders.fetch_max(holders, Ordering::AcqRel);
    self.acquisitions.fetch_add(1, Ordering::Relaxed);
    debug_assert!(holders <= GATE_PERMITS, "gate held by {holders} tasks");
    trace!(holders, "gate acquired");

    // Poison is ignored: the next holder sees the value as the last one left it.
    let value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(GateGuard {
      gate: self,
      value,
      _permit: permit,
    })
  }

  /// Refuse all pending and future acquisitions.
  pub fn close(&self) {
    self.permits.close();
  }

  pub fn is_closed(&self) -> bool {
    self.permits.is_closed()
  }

  /// Number of tasks currently holding the gate.
  pub fn holders(&self) -> usize {
    self.holders.load(Ordering::Acquire)
  }

  pub fn stats(&self) -> GateStats {
    GateStats {
      peak_holders: self.peak_holders.load(Ordering::Acquire),
      acquisitions: self.acquisitions.load(Ordering::Relaxed),
    }
  }

  pub fn into_inner(self) -> T {
    self.value.into_inner().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T: Default> Default for Gate<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}

impl<T> std::fmt::Debug for Gate<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Gate")
      .field("available", &self.permits.available_permits())
      .field("holders", &self.holders())
      .field("stats", &self.stats())
      .finish_non_exhaustive()
  }
}

/// Exclusive access to the value behind a [`Gate`]. Dropping it releases the permit.
///
/// Fields drop in order: the holder count falls first, then the lock, then the
/// permit, so the next waiter never sees a stale holder or a held lock.
pub struct GateGuard<'a, T> {
  gate: &'a Gate<T>,
  value: MutexGuard<'a, T>,
  _permit: SemaphorePermit<'a>,
}

impl<T> Deref for GateGuard<'_, T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.value
  }
}

impl<T> DerefMut for GateGuard<'_, T> {
  fn deref_mut(&mut self) -> &mut T {
    &mut self.value
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for GateGuard<'_, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("GateGuard").field(&**self).finish()
  }
}

impl<T> Drop for GateGuard<'_, T> {
  fn drop(&mut self) {
    self.gate.holders.fetch_sub(1, Ordering::AcqRel);
    trace!("gate released");
  }
}
