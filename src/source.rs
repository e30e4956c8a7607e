pub mod lines;

pub use self::lines::{EXIT_COMMAND, InputLine, LineSource, parse_line, parse_raw_line};
