use std::collections::BTreeMap;

use crate::error::{AlertError, Result};

/// 旧版指标名到序列名的映射
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("cpu", "cpu.total.nonidle"),
    ("load", "load.shortterm"),
    ("ram", "memory.nonfree_percent"),
    ("disk-read", "disk.total.disk_octets.read"),
    ("disk-write", "disk.total.disk_octets.write"),
    ("network-rx", "interface.total.if_octets.rx"),
    ("network-tx", "interface.total.if_octets.tx"),
];

pub const DEFAULT_NODATA_TARGET: &str = "nodata";

/// 将条件的指标名解析为后端序列名
#[derive(Debug, Clone)]
pub struct SeriesResolver {
    aliases: BTreeMap<String, String>,
    nodata_target: String,
}

impl SeriesResolver {
    pub fn new(aliases: BTreeMap<String, String>, nodata_target: impl Into<String>) -> Self {
        Self {
            aliases,
            nodata_target: nodata_target.into(),
        }
    }

    /// 未登记的指标名原样返回
    pub fn resolve(&self, metric: &str) -> Result<String> {
        let metric = metric.trim();
        if metric.is_empty() {
            return Err(AlertError::configuration("empty metric name"));
        }
        Ok(self
            .aliases
            .get(metric)
            .cloned()
            .unwrap_or_else(|| metric.to_string()))
    }

    /// 无数据检测序列
    pub fn is_nodata(&self, series: &str) -> bool {
        series == self.nodata_target
    }
}

impl Default for SeriesResolver {
    fn default() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(aliases, DEFAULT_NODATA_TARGET)
    }
}
