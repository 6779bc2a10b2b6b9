pub mod config;

pub use config::{Config, ConfigError, FailurePolicy, InputConfig, LogConfig, MAX_WORKERS, WorkerConfig};
