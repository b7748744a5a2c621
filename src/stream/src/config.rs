//! Stream configuration
//!
//! Channel sizing shared by every stage of a pipeline. Downstream stages inherit
//! the buffer size of the stream they consume.

use std::env;
use std::num::NonZeroUsize;
use std::thread;

/// Environment variable overriding the per-stage channel capacity.
pub const BUFFER_SIZE_ENV: &str = "CHANFLOW_BUFFER_SIZE";

const FALLBACK_BUFFER_SIZE: usize = 4;

/// Errors raised while building a [`StreamConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid buffer size {0:?}: expected a positive integer")]
    InvalidBufferSize(String),
}

/// Configuration applied to the channels backing a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    buffer_size: usize,
}

impl StreamConfig {
    pub fn new() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }

    /// Build a config from the process environment, falling back to defaults
    /// when [`BUFFER_SIZE_ENV`] is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(BUFFER_SIZE_ENV) {
            Ok(raw) => Self::new().with_buffer_size_str(&raw),
            Err(_) => Ok(Self::new()),
        }
    }

    /// Set the channel capacity. A capacity of zero is clamped to one since
    /// tokio channels require room for at least one value.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    fn with_buffer_size_str(self, raw: &str) -> Result<Self, ConfigError> {
        let parsed = raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| ConfigError::InvalidBufferSize(raw.to_string()))?;
        Ok(self.with_buffer_size(parsed))
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Logical core count, the default capacity of every stage channel.
pub fn default_buffer_size() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_BUFFER_SIZE)
}
