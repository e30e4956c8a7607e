use crate::core::{Inlet, Outlet, Result, Value};
use async_trait::async_trait;
use tokio::task::JoinHandle;

/// A running stage: the transport it produces and the task that feeds it.
pub struct StageRun {
    pub output: Inlet,
    pub handle: JoinHandle<Result<()>>,
}

/// One concurrently running processing unit.
///
/// `process` spawns the stage's task on the current tokio runtime. The task is
/// the sole owner of the output transport's producer end, so the transport
/// closes whenever the task exits, panics included.
pub trait Stage: Send {
    fn name(&self) -> &str;

    fn process(self: Box<Self>, input: Inlet) -> StageRun;
}

/// Counts reported by a source once it stops feeding the head transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub accepted: usize,
    pub malformed: usize,
}

#[async_trait]
pub trait Source: Send {
    /// Feeds `head` until input ends. Returning drops `head`, closing it.
    async fn pump(&mut self, head: Outlet) -> Result<SourceSummary>;
}

#[async_trait]
pub trait Sink: Send {
    async fn write(&mut self, value: Value) -> Result<()>;

    async fn write_batch(&mut self, values: Vec<Value>) -> Result<()> {
        for value in values {
            self.write(value).await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.flush().await
    }
}
