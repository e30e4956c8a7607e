pub mod buffer;
pub mod config;
pub mod error;
pub mod traits;
pub mod transport;
pub mod value;

pub use self::buffer::*;
pub use self::config::*;
pub use self::error::*;
pub use self::traits::*;
pub use self::transport::*;
pub use self::value::*;
