pub mod buffer;
pub mod filter;

pub use self::buffer::{BufferStage, FlushOutcome, FlushTrigger};
pub use self::filter::FilterStage;
