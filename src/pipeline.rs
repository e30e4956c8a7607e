use crate::core::{Inlet, PipelineError, Result, Sink, Source, Stage, StageRun, transport};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Stages wired head to tail, each running in its own task.
pub struct Composition {
    pub tail: Inlet,
    pub handles: Vec<(String, JoinHandle<Result<()>>)>,
}

impl Composition {
    /// Waits for every stage task, returning the first failure.
    pub async fn join(self) -> Result<()> {
        for (name, handle) in self.handles {
            handle.await??;
            info!(stage = %name, "stage finished");
        }
        Ok(())
    }

    /// Shuts the stages down without consuming the rest of their output.
    /// Dropping the tail makes the last stage fail its next send, which
    /// closes its input, and so on upstream once the head is gone.
    pub async fn abandon(self) -> Vec<(String, Result<()>)> {
        drop(self.tail);
        let mut results = Vec::with_capacity(self.handles.len());
        for (name, handle) in self.handles {
            let result = handle.await.map_err(PipelineError::from).and_then(|result| result);
            if let Err(err) = &result {
                warn!(stage = %name, error = %err, "abandoned stage stopped");
            }
            results.push((name, result));
        }
        results
    }
}

/// Feeds `head` through `stages` in order: each stage's output transport is
/// the next stage's input. With no stages the tail is the head itself.
pub fn compose(stages: Vec<Box<dyn Stage>>, head: Inlet) -> Composition {
    let mut tail = head;
    let mut handles = Vec::with_capacity(stages.len());
    for stage in stages {
        let name = stage.name().to_string();
        let StageRun { output, handle } = stage.process(tail);
        handles.push((name, handle));
        tail = output;
    }
    Composition { tail, handles }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub accepted: usize,
    pub malformed: usize,
    pub emitted: usize,
}

pub struct Pipeline {
    source: Box<dyn Source>,
    stages: Vec<Box<dyn Stage>>,
    sink: Box<dyn Sink>,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn Source>,
        stages: Vec<Box<dyn Stage>>,
        sink: Box<dyn Sink>,
    ) -> Self {
        Self {
            source,
            stages,
            sink,
        }
    }

    /// Runs until the source stops and every stage has propagated the close.
    pub async fn run(mut self) -> Result<RunSummary> {
        let (head, head_rx) = transport();
        let mut composition = compose(self.stages, head_rx);

        let mut source = self.source;
        let pump = tokio::spawn(async move { source.pump(head).await });

        let mut emitted = 0;
        while let Some(value) = composition.tail.recv().await {
            if let Err(err) = self.sink.write(value).await {
                error!(error = %err, emitted, "sink failed, stopping pipeline");
                // The source may be parked on a read that never completes.
                pump.abort();
                if let Ok(Err(source_err)) = pump.await {
                    warn!(error = %source_err, "source stopped");
                }
                composition.abandon().await;
                return Err(err);
            }
            emitted += 1;
        }
        self.sink.close().await?;

        let source_summary = pump.await??;
        composition.join().await?;

        let summary = RunSummary {
            accepted: source_summary.accepted,
            malformed: source_summary.malformed,
            emitted,
        };
        info!(
            accepted = summary.accepted,
            malformed = summary.malformed,
            emitted = summary.emitted,
            "pipeline completed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::sink::CollectSink;
    use crate::source::LineSource;
    use crate::stage::{BufferStage, FilterStage};
    use async_trait::async_trait;
    use std::io::Cursor;

    async fn collect(tail: &mut Inlet) -> Vec<Value> {
        let mut values = Vec::new();
        while let Some(value) = tail.recv().await {
            values.push(value);
        }
        values
    }

    #[tokio::test]
    async fn test_compose_without_stages_passes_through() {
        let (head, head_rx) = transport();
        let mut composition = compose(Vec::new(), head_rx);
        assert!(composition.handles.is_empty());

        tokio::spawn(async move {
            head.send(4).await.unwrap();
        });
        assert_eq!(collect(&mut composition.tail).await, vec![4]);
    }

    #[tokio::test]
    async fn test_compose_chains_in_order() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(FilterStage::new("even", |n: Value| n % 2 == 0)),
            Box::new(FilterStage::new("large", |n: Value| n > 4)),
        ];
        let (head, head_rx) = transport();
        let mut composition = compose(stages, head_rx);
        let names: Vec<&str> = composition
            .handles
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["even", "large"]);

        tokio::spawn(async move {
            for value in 1..=10 {
                head.send(value).await.unwrap();
            }
        });
        assert_eq!(collect(&mut composition.tail).await, vec![6, 8, 10]);
        composition.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_abandon_stops_every_stage() {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(FilterStage::new("first", |_| true)),
            Box::new(FilterStage::new("second", |_| true)),
        ];
        let (head, head_rx) = transport();
        let composition = compose(stages, head_rx);

        let feeder = tokio::spawn(async move {
            let mut value = 0;
            while head.send(value).await.is_ok() {
                value += 1;
            }
        });

        let results = composition.abandon().await;
        feeder.await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, result)| result.is_err()));
    }

    /// Accepts a fixed number of values, then fails.
    struct FailingSink {
        accepted: CollectSink,
        limit: usize,
    }

    #[async_trait]
    impl Sink for FailingSink {
        async fn write(&mut self, value: Value) -> Result<()> {
            if self.accepted.values().len() == self.limit {
                return Err(PipelineError::Sink("disk full".to_string()));
            }
            self.accepted.write(value).await
        }
    }

    #[tokio::test]
    async fn test_sink_failure_shuts_pipeline_down() {
        let accepted = CollectSink::new();
        let input: String = (1..=50).map(|n| format!("{n}\n")).collect();
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(FilterStage::new("pass", |_| true)),
            Box::new(BufferStage::new(crate::core::BufferConfig::default()).unwrap()),
        ];
        let pipeline = Pipeline::new(
            Box::new(LineSource::new(Cursor::new(input.into_bytes()))),
            stages,
            Box::new(FailingSink {
                accepted: accepted.clone(),
                limit: 3,
            }),
        );

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Sink(_)));
        assert_eq!(accepted.values(), vec![1, 2, 3]);
    }
}
