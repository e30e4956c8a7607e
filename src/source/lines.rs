use crate::core::{Outlet, PipelineError, Result, Source, SourceSummary, Value};
use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Stdin};
use tokio_stream::wrappers::SplitStream;
use tracing::{error, info};

pub const EXIT_COMMAND: &str = "exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    Value(Value),
    Exit,
    Malformed(String),
}

pub fn parse_line(line: &str) -> InputLine {
    let text = line.trim();
    if text == EXIT_COMMAND {
        return InputLine::Exit;
    }
    match text.parse::<Value>() {
        Ok(value) => InputLine::Value(value),
        Err(_) => InputLine::Malformed(text.to_string()),
    }
}

/// Like [`parse_line`], but for raw bytes. Lines that are not valid UTF-8
/// are malformed rather than a read error.
pub fn parse_raw_line(raw: &[u8]) -> InputLine {
    match std::str::from_utf8(raw) {
        Ok(line) => parse_line(line),
        Err(_) => InputLine::Malformed(String::from_utf8_lossy(raw).trim().to_string()),
    }
}

/// Reads one integer per line and feeds it into the head transport.
///
/// Malformed lines are reported and skipped. A literal `exit` line or end of
/// input stops the pump.
pub struct LineSource<R> {
    reader: Option<R>,
    prompt: Option<String>,
}

impl<R> LineSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

impl LineSource<Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[async_trait]
impl<R> Source for LineSource<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn pump(&mut self, head: Outlet) -> Result<SourceSummary> {
        let reader = self.reader.take().ok_or_else(|| {
            PipelineError::Source(anyhow::anyhow!("line source has already been drained"))
        })?;
        if let Some(prompt) = &self.prompt {
            println!("{prompt}");
        }

        let mut lines = SplitStream::new(BufReader::new(reader).split(b'\n'));
        let mut summary = SourceSummary::default();

        while let Some(line) = lines.next().await {
            match parse_raw_line(&line?) {
                InputLine::Value(value) => {
                    info!(value, "received value");
                    head.send(value)
                        .await
                        .map_err(|_| PipelineError::transport_closed("source"))?;
                    summary.accepted += 1;
                }
                InputLine::Exit => {
                    info!("received exit command");
                    break;
                }
                InputLine::Malformed(text) => {
                    error!(line = %text, "malformed input, expected an integer");
                    summary.malformed += 1;
                }
            }
        }

        Ok(summary)
    }
}
