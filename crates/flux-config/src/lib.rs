pub mod alertd;
pub mod error;
pub mod loader;

pub use alertd::{
    AlertSection, AlertdConfig, MetricsSection, NotifySection, PollSection, StoreSection,
};
pub use error::{ConfigError, Result};
pub use flux_logging::{LogFormat, LoggingConfig};
pub use loader::ConfigLoader;
