use crate::core::{Result, Sink, Value};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects emitted values in arrival order. Clones share the same storage,
/// so a handle kept outside a running pipeline can read the results.
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    values: Arc<Mutex<Vec<Value>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<Value> {
        self.values.lock().clone()
    }
}

#[async_trait]
impl Sink for CollectSink {
    async fn write(&mut self, value: Value) -> Result<()> {
        self.values.lock().push(value);
        Ok(())
    }
}
