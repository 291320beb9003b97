use flux_logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// 告警服务配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertdConfig {
    pub poll: PollSection,
    pub metrics: MetricsSection,
    pub notify: NotifySection,
    pub store: StoreSection,
    pub alert: AlertSection,
    pub logging: LoggingConfig,
}

/// 轮询配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollSection {
    /// 轮询周期（秒）
    pub period_secs: u64,

    /// 单轮内并发评估的资源数
    pub concurrency: usize,

    /// 启动后首轮前的等待（秒）
    pub startup_delay_secs: u64,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            period_secs: 10,
            concurrency: 4,
            startup_delay_secs: 0,
        }
    }
}

impl PollSection {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

/// 指标后端配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsSection {
    pub uri: String,

    /// 资源序列前缀
    pub prefix: String,

    /// 查询窗口（秒）
    pub window_secs: u64,

    pub timeout_secs: u64,
    pub ssl_verify: bool,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            uri: "http://localhost:8080".to_string(),
            prefix: "mist".to_string(),
            window_secs: 90,
            timeout_secs: 10,
            ssl_verify: true,
        }
    }
}

impl MetricsSection {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 通知配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifySection {
    pub core_uri: String,
    pub timeout_secs: u64,
    pub ssl_verify: bool,
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            core_uri: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            ssl_verify: true,
        }
    }
}

impl NotifySection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 持久化配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSection {
    /// JSON 快照文件路径
    pub path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/alertd.json"),
        }
    }
}

/// 告警评估配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertSection {
    /// 默认提醒间隔（秒），条件未配置时使用
    pub reminder_list: Vec<u64>,

    /// 激活后条件的静默期（秒）
    pub activation_grace_secs: u64,

    /// 无数据检测使用的指标名
    pub nodata_target: String,

    /// 指标名到序列名的映射
    pub series_aliases: BTreeMap<String, String>,

    /// 上报前的单位换算除数
    pub unit_divisors: BTreeMap<String, f64>,
}

impl Default for AlertSection {
    fn default() -> Self {
        let series_aliases = [
            ("cpu", "cpu.total.nonidle"),
            ("load", "load.shortterm"),
            ("ram", "memory.nonfree_percent"),
            ("disk-read", "disk.total.disk_octets.read"),
            ("disk-write", "disk.total.disk_octets.write"),
            ("network-rx", "interface.total.if_octets.rx"),
            ("network-tx", "interface.total.if_octets.tx"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let unit_divisors = [("network-tx", 1024.0), ("disk-write", 1024.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        Self {
            reminder_list: vec![0, 60, 300, 600],
            activation_grace_secs: 30,
            nodata_target: "nodata".to_string(),
            series_aliases,
            unit_divisors,
        }
    }
}

impl AlertdConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.poll.period_secs == 0 {
            return Err(ConfigError::invalid("poll.period_secs must be greater than 0"));
        }
        if self.poll.concurrency == 0 {
            return Err(ConfigError::invalid("poll.concurrency must be greater than 0"));
        }
        if self.metrics.window_secs == 0 {
            return Err(ConfigError::invalid("metrics.window_secs must be greater than 0"));
        }
        if self.metrics.timeout_secs == 0 || self.notify.timeout_secs == 0 {
            return Err(ConfigError::invalid("timeouts must be greater than 0"));
        }
        if self.metrics.uri.is_empty() {
            return Err(ConfigError::invalid("metrics.uri is empty"));
        }
        if self.notify.core_uri.is_empty() {
            return Err(ConfigError::invalid("notify.core_uri is empty"));
        }
        if self.alert.reminder_list.is_empty() {
            return Err(ConfigError::invalid("alert.reminder_list must not be empty"));
        }
        if let Some((metric, divisor)) = self
            .alert
            .unit_divisors
            .iter()
            .find(|(_, d)| !(**d > 0.0))
        {
            return Err(ConfigError::invalid(format!(
                "unit divisor for {} must be positive, got {}",
                metric, divisor
            )));
        }
        Ok(())
    }
}
