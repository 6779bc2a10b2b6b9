//! Configuration system for sortgate with per-directory overrides.
//!
//! Config priority: explicit file > directory-relative (.sortgate.toml) > user (~/.config/sortgate/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on concurrently spawned worker tasks.
///
/// One worker is spawned per accepted line, so this is also the hard cap on
/// accepted input lines. Lowering `input.max_lines` is allowed, raising it is not.
pub const MAX_WORKERS: usize = 100;

/// Name of the directory-relative config file
pub const PROJECT_CONFIG_FILE: &str = ".sortgate.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
  #[error("invalid config: {0}")]
  Invalid(String),
}

// ============================================================================
// Input Configuration
// ============================================================================

/// Line reader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
  /// Line that ends input collection, compared case-sensitively (default: "stop!")
  pub sentinel: String,

  /// Maximum number of accepted lines (default: 100, at most MAX_WORKERS)
  pub max_lines: usize,

  /// First allocation of the line buffer in bytes, doubled on overflow (default: 256)
  pub initial_buffer: usize,
}

impl Default for InputConfig {
  fn default() -> Self {
    Self {
      sentinel: "stop!".to_string(),
      max_lines: MAX_WORKERS,
      initial_buffer: 256,
    }
  }
}

// ============================================================================
// Worker Configuration
// ============================================================================

/// What to do when a worker fails before it reaches the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
  /// Fail the whole run
  #[default]
  Abort,
  /// Log the failure and leave the item out of the result
  Skip,
}

impl std::str::FromStr for FailurePolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "abort" => Ok(FailurePolicy::Abort),
      "skip" => Ok(FailurePolicy::Skip),
      _ => Err(format!("Invalid failure policy: {}", s)),
    }
  }
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
  /// Artificial delay per byte of payload before a worker contends for the gate
  /// Default: 1000 (one second per byte)
  pub delay_per_byte_ms: u64,

  /// Behavior when a worker fails before inserting (default: abort)
  pub on_failure: FailurePolicy,
}

impl Default for WorkerConfig {
  fn default() -> Self {
    Self {
      delay_per_byte_ms: 1000,
      on_failure: FailurePolicy::Abort,
    }
  }
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Log level: "off", "error", "warn", "info", "debug", "trace"
  /// Default: "warn"
  pub level: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "warn".to_string(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// sortgate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Line reader settings
  #[serde(default)]
  pub input: InputConfig,

  /// Worker pool settings
  #[serde(default)]
  pub workers: WorkerConfig,

  /// Logging settings
  #[serde(default)]
  pub log: LogConfig,
}

impl Config {
  /// Load config for a directory, with fallback to user config.
  ///
  /// Unreadable or malformed files are skipped, same as missing ones.
  pub fn load_for_dir(dir: &Path) -> Self {
    let local_config = Self::project_config_path(dir);
    if local_config.exists()
      && let Ok(config) = Self::from_file(&local_config)
    {
      return config;
    }

    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(config) = Self::from_file(&user_config_path)
    {
      return config;
    }

    Self::default()
  }

  /// Load config from an explicit path. Any failure is reported.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("sortgate").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("sortgate").join("config.toml"))
  }

  /// Get the directory-relative config path
  pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILE)
  }

  /// Reject settings the worker pool cannot honor
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.input.sentinel.is_empty() {
      return Err(ConfigError::Invalid("input.sentinel must not be empty".to_string()));
    }
    if self.input.sentinel.contains('\n') {
      return Err(ConfigError::Invalid("input.sentinel must be a single line".to_string()));
    }
    if self.input.max_lines == 0 || self.input.max_lines > MAX_WORKERS {
      return Err(ConfigError::Invalid(format!(
        "input.max_lines must be between 1 and {}, got {}",
        MAX_WORKERS, self.input.max_lines
      )));
    }
    if self.input.initial_buffer == 0 {
      return Err(ConfigError::Invalid("input.initial_buffer must be positive".to_string()));
    }
    Ok(())
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    let defaults = Self::default();
    format!(
      r#"# sortgate Configuration
# Place in ./{project_file} or ~/.config/sortgate/config.toml (user)

[input]
# Line that ends input (case-sensitive)
sentinel = "{sentinel}"

# Maximum accepted lines, one worker each (1..={max_workers})
max_lines = {max_lines}

# Initial line buffer size in bytes, doubled whenever a line does not fit
initial_buffer = {initial_buffer}

[workers]
# Each worker sleeps this long per byte of its line before inserting
delay_per_byte_ms = {delay}

# What happens when a worker fails before inserting: abort or skip
on_failure = "abort"

[log]
# off, error, warn, info, debug, trace (RUST_LOG overrides)
level = "{level}"
"#,
      project_file = PROJECT_CONFIG_FILE,
      sentinel = defaults.input.sentinel,
      max_workers = MAX_WORKERS,
      max_lines = defaults.input.max_lines,
      initial_buffer = defaults.input.initial_buffer,
      delay = defaults.workers.delay_per_byte_ms,
      level = defaults.log.level,
    )
  }
}
