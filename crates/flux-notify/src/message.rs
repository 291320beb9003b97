use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 告警通知
///
/// 一次状态通知（告警或恢复）需要携带的全部字段
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotification {
    /// 资源 ID
    pub resource_id: String,

    /// 资源密钥，用于核心服务鉴权
    pub secret: String,

    /// 规则 ID
    pub rule_id: String,

    /// 已换算单位的代表值
    pub value: f64,

    /// 是否处于触发状态
    pub triggered: bool,

    /// 进入当前状态的时间
    pub since: Option<DateTime<Utc>>,

    /// 提醒级别
    pub level: u32,

    /// 事件 ID，关联同一次连续触发
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
}

impl AlertNotification {
    /// `since` 的 Unix 秒，未知时为 0
    pub fn since_timestamp(&self) -> i64 {
        self.since.map(|t| t.timestamp()).unwrap_or(0)
    }

    /// 以查询参数形式编码
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("machine_uuid", self.resource_id.clone()),
            ("machine_password", self.secret.clone()),
            ("rule_id", self.rule_id.clone()),
            ("value", self.value.to_string()),
            ("triggered", u8::from(self.triggered).to_string()),
            ("since", self.since_timestamp().to_string()),
            ("notification_level", self.level.to_string()),
        ];
        if let Some(incident_id) = &self.incident_id {
            params.push(("incident_id", incident_id.clone()));
        }
        params
    }
}

// 不在日志中输出密钥
impl fmt::Debug for AlertNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertNotification")
            .field("resource_id", &self.resource_id)
            .field("secret", &"***")
            .field("rule_id", &self.rule_id)
            .field("value", &self.value)
            .field("triggered", &self.triggered)
            .field("since", &self.since)
            .field("level", &self.level)
            .field("incident_id", &self.incident_id)
            .finish()
    }
}
