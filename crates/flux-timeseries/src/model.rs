use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// 单个采样点，值可能缺失
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub value: Option<f64>,
    /// Unix 时间戳（秒）
    pub timestamp: i64,
}

impl DataPoint {
    pub fn new(value: Option<f64>, timestamp: i64) -> Self {
        Self { value, timestamp }
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }
}

/// 一条时间序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// 序列名称（与请求时的名称一致）
    pub name: String,

    /// 按时间排序的采样点
    pub points: Vec<DataPoint>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<DataPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// 去掉缺失值后的采样值
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(|p| p.value.is_none())
    }
}
