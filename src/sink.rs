pub mod console;
pub mod memory;

pub use self::console::ConsoleSink;
pub use self::memory::CollectSink;
