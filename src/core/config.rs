use crate::core::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// How the flush triggered by upstream close treats the drain timeout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FinalFlush {
    /// Drain everything, waiting on downstream as long as it takes.
    #[default]
    Drain,
    /// Honour the drain timeout; values still buffered when it fires are lost.
    Bounded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BufferConfig {
    pub capacity: usize,
    pub flush_period_ms: u64,
    pub drain_timeout_ms: u64,
    pub final_flush: FinalFlush,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            flush_period_ms: 2_000,
            drain_timeout_ms: 500,
            final_flush: FinalFlush::Drain,
        }
    }
}

impl BufferConfig {
    /// Builds and validates a config. Durations are kept in whole
    /// milliseconds, so anything finer is rejected instead of truncated.
    pub fn new(capacity: usize, flush_period: Duration, drain_timeout: Duration) -> Result<Self> {
        let config = Self {
            capacity,
            flush_period_ms: whole_millis("flush period", flush_period)?,
            drain_timeout_ms: whole_millis("drain timeout", drain_timeout)?,
            final_flush: FinalFlush::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_final_flush(mut self, final_flush: FinalFlush) -> Self {
        self.final_flush = final_flush;
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PipelineError::Config(
                "buffer capacity must be positive".to_string(),
            ));
        }
        if self.flush_period_ms == 0 {
            return Err(PipelineError::Config(
                "flush period must be positive".to_string(),
            ));
        }
        if self.drain_timeout_ms == 0 {
            return Err(PipelineError::Config(
                "drain timeout must be positive".to_string(),
            ));
        }
        if self.drain_timeout_ms >= self.flush_period_ms {
            warn!(
                drain_timeout_ms = self.drain_timeout_ms,
                flush_period_ms = self.flush_period_ms,
                "drain timeout is not smaller than the flush period"
            );
        }
        Ok(())
    }

    pub fn capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.capacity)
            .ok_or_else(|| PipelineError::Config("buffer capacity must be positive".to_string()))
    }

    pub fn flush_period(&self) -> Duration {
        Duration::from_millis(self.flush_period_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

fn whole_millis(what: &str, duration: Duration) -> Result<u64> {
    if duration.subsec_nanos() % 1_000_000 != 0 {
        return Err(PipelineError::Config(format!(
            "{what} must be a whole number of milliseconds, got {duration:?}"
        )));
    }
    u64::try_from(duration.as_millis())
        .map_err(|_| PipelineError::Config(format!("{what} is too large: {duration:?}")))
}
