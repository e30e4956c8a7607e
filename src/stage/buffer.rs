//! Capacity- and time-bounded batching stage.
//!
//! Incoming values are parked in a [`BoundedBuffer`] and released downstream
//! on three triggers: the buffer overflowing, the flush ticker firing, and the
//! input transport closing. All three are handled by one `select!` loop, so
//! only one trigger is ever acted on at a time.

use crate::core::{
    BoundedBuffer, BufferConfig, FinalFlush, Inlet, Outlet, PipelineError, Result, Stage,
    StageRun, Value, transport,
};
use std::fmt;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout_at};
use tracing::{info, warn};

const STAGE_NAME: &str = "buffer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Overflow,
    Tick,
    Close,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushTrigger::Overflow => write!(f, "overflow"),
            FlushTrigger::Tick => write!(f, "tick"),
            FlushTrigger::Close => write!(f, "close"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushOutcome {
    pub drained: usize,
    pub remaining: usize,
    pub timed_out: bool,
}

pub struct BufferStage {
    buffer: BoundedBuffer,
    flush_period: Duration,
    drain_timeout: Duration,
    final_flush: FinalFlush,
}

impl BufferStage {
    pub fn new(config: BufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            buffer: BoundedBuffer::new(config.capacity()?),
            flush_period: config.flush_period(),
            drain_timeout: config.drain_timeout(),
            final_flush: config.final_flush,
        })
    }

    async fn run(self, mut input: Inlet, output: Outlet) -> Result<()> {
        // The ticker lives in this task and stops when the task returns.
        let mut ticker = interval_at(Instant::now() + self.flush_period, self.flush_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            capacity = self.buffer.capacity(),
            flush_period_ms = self.flush_period.as_millis() as u64,
            drain_timeout_ms = self.drain_timeout.as_millis() as u64,
            "buffer stage started"
        );

        loop {
            tokio::select! {
                received = input.recv() => match received {
                    Some(value) => self.accept(value, &output).await?,
                    None => {
                        let outcome = self.flush(&output, FlushTrigger::Close).await?;
                        if outcome.remaining > 0 {
                            warn!(lost = outcome.remaining, "buffer stage closed with values still buffered");
                        }
                        info!("input closed, buffer stage stopped");
                        return Ok(());
                    }
                },
                _ = ticker.tick() => {
                    if !self.buffer.is_empty() {
                        self.flush(&output, FlushTrigger::Tick).await?;
                    }
                }
            }
        }
    }

    /// Buffers `value`. On overflow the buffer is flushed and the push is
    /// retried once; if the retry still fails the value is dropped.
    async fn accept(&self, value: Value, output: &Outlet) -> Result<()> {
        if self.buffer.push(value) {
            return Ok(());
        }

        self.flush(output, FlushTrigger::Overflow).await?;
        if !self.buffer.push(value) {
            warn!(value, "buffer still full after overflow flush, value dropped");
        }
        Ok(())
    }

    /// Moves buffered values downstream until the buffer is empty or the
    /// drain deadline passes. An output slot is reserved before each pop, so
    /// a timed-out flush leaves every undelivered value in the buffer.
    async fn flush(&self, output: &Outlet, trigger: FlushTrigger) -> Result<FlushOutcome> {
        let deadline = match (trigger, self.final_flush) {
            (FlushTrigger::Close, FinalFlush::Drain) => None,
            _ => Some(Instant::now() + self.drain_timeout),
        };

        let mut drained = 0;
        while !self.buffer.is_empty() {
            let reserved = match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    return Ok(self.timed_out(trigger, drained));
                }
                Some(deadline) => match timeout_at(deadline, output.reserve()).await {
                    Ok(reserved) => reserved,
                    Err(_) => return Ok(self.timed_out(trigger, drained)),
                },
                None => output.reserve().await,
            };
            let permit = reserved.map_err(|_| PipelineError::transport_closed(STAGE_NAME))?;

            let Some(value) = self.buffer.pop() else {
                break;
            };
            permit.send(value);
            drained += 1;
        }

        info!(%trigger, drained, "buffer flushed");
        Ok(FlushOutcome {
            drained,
            remaining: 0,
            timed_out: false,
        })
    }

    fn timed_out(&self, trigger: FlushTrigger, drained: usize) -> FlushOutcome {
        let remaining = self.buffer.len();
        warn!(%trigger, drained, remaining, "buffer drain timed out");
        FlushOutcome {
            drained,
            remaining,
            timed_out: true,
        }
    }
}

impl Stage for BufferStage {
    fn name(&self) -> &str {
        STAGE_NAME
    }

    fn process(self: Box<Self>, input: Inlet) -> StageRun {
        let (output_tx, output) = transport();
        let handle = tokio::spawn(self.run(input, output_tx));
        StageRun { output, handle }
    }
}
