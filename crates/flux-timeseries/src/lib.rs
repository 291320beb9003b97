pub mod backend;
pub mod error;
pub mod graphite;
pub mod model;
pub mod query;

pub use backend::MetricsBackend;
pub use error::{Result, TimeSeriesError};
pub use graphite::{GraphiteBackend, GraphiteConfig};
pub use model::{DataPoint, Series};
pub use query::SeriesQuery;
