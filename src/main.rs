use anyhow::Context;
use npipeline::sink::ConsoleSink;
use npipeline::source::LineSource;
use npipeline::stage::{BufferStage, FilterStage};
use npipeline::{BufferConfig, Pipeline, Stage, Value};
use std::env;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout only carries prompts and results.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => BufferConfig::load(&path)
            .await
            .with_context(|| format!("failed to load buffer config from {path}"))?,
        None => BufferConfig::default(),
    };

    let stages: Vec<Box<dyn Stage>> = vec![
        Box::new(FilterStage::new("non-negative", |n: Value| n >= 0)),
        Box::new(FilterStage::new("multiple of three", |n: Value| {
            n != 0 && n % 3 == 0
        })),
        Box::new(BufferStage::new(config).context("invalid buffer config")?),
    ];

    let source = LineSource::stdin().with_prompt(
        "Enter integers, one per line (type 'exit' to finish).\nExample input: 1, -5, 10, 15",
    );
    let pipeline = Pipeline::new(Box::new(source), stages, Box::new(ConsoleSink::stdout()));

    let summary = pipeline.run().await?;
    println!(
        "Done: {} accepted, {} malformed, {} emitted.",
        summary.accepted, summary.malformed, summary.emitted
    );

    Ok(())
}
