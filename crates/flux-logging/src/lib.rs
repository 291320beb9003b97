pub mod duration;
pub mod subscriber;

pub use duration::{format_duration, format_since};
pub use subscriber::{init_logging, LogFormat, LoggingConfig, LoggingError};
