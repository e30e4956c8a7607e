pub mod core;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod stage;

pub use crate::core::*;
pub use crate::pipeline::{Pipeline, RunSummary, compose};
