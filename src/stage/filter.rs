use crate::core::{Inlet, Outlet, PipelineError, Result, Stage, StageRun, Value, transport};
use tracing::info;

/// Forwards values that satisfy a predicate and drops the rest.
///
/// Forwarding awaits capacity on the output, so a slow consumer slows this
/// stage and, in turn, its producer.
pub struct FilterStage<F>
where
    F: Fn(Value) -> bool + Send + Sync + 'static,
{
    label: String,
    predicate: F,
}

impl<F> FilterStage<F>
where
    F: Fn(Value) -> bool + Send + Sync + 'static,
{
    pub fn new(label: impl Into<String>, predicate: F) -> Self {
        Self {
            label: label.into(),
            predicate,
        }
    }

    async fn run(self, mut input: Inlet, output: Outlet) -> Result<()> {
        while let Some(value) = input.recv().await {
            if (self.predicate)(value) {
                info!(filter = %self.label, value, "passed");
                output
                    .send(value)
                    .await
                    .map_err(|_| PipelineError::transport_closed(&self.label))?;
            } else {
                info!(filter = %self.label, value, "filtered");
            }
        }
        info!(filter = %self.label, "input closed, closing output");
        Ok(())
    }
}

impl<F> Stage for FilterStage<F>
where
    F: Fn(Value) -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.label
    }

    fn process(self: Box<Self>, input: Inlet) -> StageRun {
        let (output_tx, output) = transport();
        let handle = tokio::spawn(self.run(input, output_tx));
        StageRun { output, handle }
    }
}
