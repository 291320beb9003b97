use flux_notify::NotifyError;
use flux_timeseries::TimeSeriesError;
use thiserror::Error;

/// 告警引擎错误
#[derive(Error, Debug)]
pub enum AlertError {
    /// 条件配置无效（未知操作符、聚合方式或无法解析的指标）
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Condition not found: {0}")]
    ConditionNotFound(String),

    #[error("Metrics backend error: {0}")]
    Backend(#[from] TimeSeriesError),

    #[error("Notification delivery failed: {0}")]
    Delivery(#[from] NotifyError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// 评估任务在获取并发许可前被取消
    #[error("Evaluation cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlertError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// 是否为"未找到"类错误，通常由并发的规则编辑导致
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ResourceNotFound(_) | Self::RuleNotFound(_) | Self::ConditionNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AlertError>;
