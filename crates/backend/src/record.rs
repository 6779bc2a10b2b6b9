//! One accepted input line.

use std::{borrow::Cow, fmt};

use crate::error::SortError;

/// Immutable owned copy of one input line without its `\n` terminator.
///
/// Ordering is plain lexicographic byte order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringRecord(Box<[u8]>);

impl StringRecord {
  /// Copy `bytes` into a fresh allocation, reporting allocation failure instead of aborting.
  pub fn copy_from(bytes: &[u8]) -> Result<Self, SortError> {
    let mut owned = Vec::new();
    owned
      .try_reserve_exact(bytes.len())
      .map_err(|_| SortError::allocation("copy record", bytes.len()))?;
    owned.extend_from_slice(bytes);
    Ok(Self(owned.into_boxed_slice()))
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn to_string_lossy(&self) -> Cow<'_, str> {
    String::from_utf8_lossy(&self.0)
  }
}

impl From<&str> for StringRecord {
  fn from(value: &str) -> Self {
    Self(value.as_bytes().into())
  }
}

impl From<String> for StringRecord {
  fn from(value: String) -> Self {
    Self(value.into_bytes().into_boxed_slice())
  }
}

impl fmt::Display for StringRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_string_lossy())
  }
}

impl fmt::Debug for StringRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.to_string_lossy())
  }
}
