use crate::core::{Result, Sink, Value};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter, Stdout};

/// Renders every emitted value as a `Received value: N` line.
pub struct ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    writer: BufWriter<W>,
}

impl<W> ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> Sink for ConsoleSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, value: Value) -> Result<()> {
        let line = format!("Received value: {value}\n");
        self.writer.write_all(line.as_bytes()).await?;
        // Interactive use: show each value as soon as it leaves the pipeline.
        self.writer.flush().await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_renders_one_line_per_value() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.write(3).await.unwrap();
        sink.write_batch(vec![-6, 9]).await.unwrap();
        sink.close().await.unwrap();

        let rendered = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            rendered,
            "Received value: 3\nReceived value: -6\nReceived value: 9\n"
        );
    }
}
