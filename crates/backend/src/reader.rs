//! Interactive line collection.
//!
//! [`LineReader`] prompts for each line, reads it into a growable buffer and
//! stops at the sentinel line or once the line limit is reached. Lines of any
//! length are accepted: the buffer starts at `initial_buffer` bytes and
//! doubles whenever a line does not fit.

use std::io::{self, BufRead, Write};

use sortgate_core::{InputConfig, MAX_WORKERS};
use tracing::{debug, trace};

use crate::{error::SortError, record::StringRecord};

/// Anything that can supply the lines to sort.
pub trait LineSource {
  /// Collect every accepted line, in input order.
  fn read_lines(&mut self) -> Result<Vec<StringRecord>, SortError>;
}

impl LineSource for Vec<StringRecord> {
  fn read_lines(&mut self) -> Result<Vec<StringRecord>, SortError> {
    Ok(std::mem::take(self))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSettings {
  /// Line that ends input, compared byte for byte
  pub sentinel: String,
  /// Accepted lines after which reading stops without waiting for the sentinel
  pub max_lines: usize,
  /// First buffer allocation in bytes
  pub initial_buffer: usize,
}

impl Default for ReaderSettings {
  fn default() -> Self {
    Self::from(&InputConfig::default())
  }
}

impl From<&InputConfig> for ReaderSettings {
  fn from(config: &InputConfig) -> Self {
    Self {
      sentinel: config.sentinel.clone(),
      max_lines: config.max_lines.min(MAX_WORKERS),
      initial_buffer: config.initial_buffer.max(1),
    }
  }
}

/// Reads lines from `input`, writing a `"<n>: "` prompt to `prompt` before each one.
pub struct LineReader<R, W> {
  input: R,
  prompt: W,
  buffer: Vec<u8>,
  settings: ReaderSettings,
}

impl<R: BufRead, W: Write> LineReader<R, W> {
  pub fn new(input: R, prompt: W, settings: ReaderSettings) -> Self {
    Self {
      input,
      prompt,
      buffer: Vec::new(),
      settings,
    }
  }

  /// Current size of the line buffer. Never shrinks between lines.
  pub fn buffer_capacity(&self) -> usize {
    self.buffer.capacity()
  }

  pub fn into_inner(self) -> (R, W) {
    (self.input, self.prompt)
  }

  fn write_prompt(&mut self, index: usize) -> Result<(), SortError> {
    write!(self.prompt, "{}: ", index).map_err(|e| SortError::io("write prompt", e))?;
    self.prompt.flush().map_err(|e| SortError::io("write prompt", e))
  }

  /// Read one full line into `self.buffer`, without its `\n`.
  ///
  /// Input that ends before a `\n` is an error: a partial line is never accepted.
  fn fill_line(&mut self) -> Result<(), SortError> {
    self.buffer.clear();
    loop {
      let available = match self.input.fill_buf() {
        Ok(available) => available,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(SortError::io("read line", e)),
      };
      if available.is_empty() {
        return Err(SortError::io(
          "read line",
          io::Error::new(io::ErrorKind::UnexpectedEof, "input ended before a complete line"),
        ));
      }

      let (take, complete) = match available.iter().position(|&b| b == b'\n') {
        Some(newline) => (newline + 1, true),
        None => (available.len(), false),
      };
      if reserve_doubling(&mut self.buffer, take, self.settings.initial_buffer)? {
        trace!(capacity = self.buffer.capacity(), "line buffer grew");
      }
      self.buffer.extend_from_slice(&available[..take]);
      self.input.consume(take);

      if complete {
        self.buffer.pop();
        return Ok(());
      }
    }
  }
}

impl<R: BufRead, W: Write> LineSource for LineReader<R, W> {
  fn read_lines(&mut self) -> Result<Vec<StringRecord>, SortError> {
    let max_lines = self.settings.max_lines;
    let mut records = Vec::new();
    records
      .try_reserve_exact(max_lines)
      .map_err(|_| SortError::allocation("reserve records", max_lines * size_of::<StringRecord>()))?;

    while records.len() < max_lines {
      self.write_prompt(records.len() + 1)?;
      self.fill_line()?;

      if self.buffer == self.settings.sentinel.as_bytes() {
        debug!(accepted = records.len(), "sentinel received");
        return Ok(records);
      }
      records.push(StringRecord::copy_from(&self.buffer)?);
    }

    debug!(accepted = records.len(), "line limit reached");
    Ok(records)
  }
}

/// Make room for `additional` more bytes, doubling capacity until they fit.
///
/// The first allocation is `initial` bytes. Returns whether the buffer grew.
fn reserve_doubling(buffer: &mut Vec<u8>, additional: usize, initial: usize) -> Result<bool, SortError> {
  let overflow = || SortError::allocation("grow line buffer", usize::MAX);

  let required = buffer.len().checked_add(additional).ok_or_else(overflow)?;
  if required <= buffer.capacity() {
    return Ok(false);
  }

  let mut target = buffer.capacity().max(initial);
  while target < required {
    target = target.checked_mul(2).ok_or_else(overflow)?;
  }
  buffer
    .try_reserve_exact(target - buffer.len())
    .map_err(|_| SortError::allocation("grow line buffer", target))?;
  Ok(true)
}
