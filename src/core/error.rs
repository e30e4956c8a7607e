use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source error: {0}")]
    Source(#[from] anyhow::Error),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Stage error: {0}")]
    Stage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport closed: downstream of '{stage}' went away")]
    TransportClosed { stage: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    pub fn transport_closed(stage: impl Into<String>) -> Self {
        Self::TransportClosed {
            stage: stage.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
