use crate::error::{Result, TimeSeriesError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// 批量序列查询
///
/// 一次查询同一资源下的多条序列，时间窗口为相对当前时间的最近一段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesQuery {
    /// 资源 ID
    pub resource_id: String,

    /// 序列名称集合
    pub series: BTreeSet<String>,

    /// 回溯窗口
    pub window: Duration,
}

impl SeriesQuery {
    pub fn new(resource_id: impl Into<String>, window: Duration) -> Self {
        Self {
            resource_id: resource_id.into(),
            series: BTreeSet::new(),
            window,
        }
    }

    pub fn with_series(mut self, name: impl Into<String>) -> Self {
        self.series.insert(name.into());
        self
    }

    pub fn with_all_series<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.series.extend(names.into_iter().map(Into::into));
        self
    }

    /// 相对起始时间，例如 `-90s`
    pub fn relative_start(&self) -> String {
        format!("-{}s", self.window.as_secs())
    }

    pub fn validate(&self) -> Result<()> {
        if self.resource_id.is_empty() {
            return Err(TimeSeriesError::InvalidQuery("empty resource id".to_string()));
        }
        if self.series.is_empty() {
            return Err(TimeSeriesError::InvalidQuery("no series requested".to_string()));
        }
        if self.window.as_secs() == 0 {
            return Err(TimeSeriesError::InvalidQuery("zero window".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = SeriesQuery::new("machine-1", Duration::from_secs(90))
            .with_series("cpu.total.nonidle")
            .with_all_series(["load.shortterm", "cpu.total.nonidle"]);

        assert_eq!(query.series.len(), 2);
        assert_eq!(query.relative_start(), "-90s");
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_query_validation() {
        let empty = SeriesQuery::new("machine-1", Duration::from_secs(90));
        assert!(empty.validate().is_err());

        let no_window = SeriesQuery::new("machine-1", Duration::ZERO).with_series("cpu");
        assert!(no_window.validate().is_err());
    }
}
