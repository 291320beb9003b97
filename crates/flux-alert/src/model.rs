use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AlertError, Result};

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// 大于阈值
    Gt,
    /// 小于阈值
    Lt,
}

impl Operator {
    pub fn matches(&self, sample: f64, threshold: f64) -> bool {
        match self {
            Operator::Gt => sample > threshold,
            Operator::Lt => sample < threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
        }
    }
}

impl FromStr for Operator {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gt" => Ok(Operator::Gt),
            "lt" => Ok(Operator::Lt),
            other => Err(AlertError::configuration(format!(
                "unknown operator '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Gt => write!(f, "gt"),
            Operator::Lt => write!(f, "lt"),
        }
    }
}

/// 聚合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    /// 所有样本都满足
    All,
    /// 任一样本满足
    Any,
    /// 先求均值再比较
    #[serde(alias = "avg")]
    Average,
}

impl FromStr for Aggregate {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Aggregate::All),
            "any" => Ok(Aggregate::Any),
            "avg" | "average" => Ok(Aggregate::Average),
            other => Err(AlertError::configuration(format!(
                "unknown aggregate '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::All => write!(f, "all"),
            Aggregate::Any => write!(f, "any"),
            Aggregate::Average => write!(f, "avg"),
        }
    }
}

fn default_level() -> u32 {
    1
}

/// 告警条件
///
/// 一条绑定到资源和指标的阈值规则。`operator` 与 `aggregate` 以字符串形式
/// 持久化，由评估器在使用前校验，无效值只会跳过该条件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// 条件 ID
    pub id: String,

    /// 所属资源 ID
    pub resource_id: String,

    /// 规则 ID
    pub rule_id: String,

    /// 指标名
    pub metric: String,

    /// "gt" | "lt"
    pub operator: String,

    /// "all" | "any" | "avg"，缺省时按 "all" 处理并回写
    #[serde(default)]
    pub aggregate: Option<String>,

    /// 阈值
    pub threshold: f64,

    /// 提醒间隔（秒），为空时使用系统默认值
    #[serde(default)]
    pub reminder_list: Vec<u64>,

    /// 每个提醒间隔附加的偏移（秒）
    #[serde(default)]
    pub reminder_offset: u64,

    /// 在此时间之前不评估
    #[serde(default)]
    pub active_after: Option<DateTime<Utc>>,

    /// 当前是否触发
    #[serde(default)]
    pub state: bool,

    /// 最近一次状态变化的时间
    #[serde(default)]
    pub state_since: Option<DateTime<Utc>>,

    /// 当前状态下已发送的通知数
    #[serde(default = "default_level")]
    pub notification_level: u32,

    /// 当前事件 ID
    #[serde(default)]
    pub incident_id: Option<String>,
}

impl Condition {
    /// 新建条件，初始通知级别为 1，避免从未触发就发送恢复通知
    pub fn new(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        rule_id: impl Into<String>,
        metric: impl Into<String>,
        operator: Operator,
        aggregate: Aggregate,
        threshold: f64,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            rule_id: rule_id.into(),
            metric: metric.into(),
            operator: operator.to_string(),
            aggregate: Some(aggregate.to_string()),
            threshold,
            reminder_list: Vec::new(),
            reminder_offset: 0,
            active_after: None,
            state: false,
            state_since: None,
            notification_level: default_level(),
            incident_id: None,
        }
    }

    pub fn with_reminders(mut self, reminder_list: Vec<u64>, reminder_offset: u64) -> Self {
        self.reminder_list = reminder_list;
        self.reminder_offset = reminder_offset;
        self
    }

    pub fn parse_operator(&self) -> Result<Operator> {
        self.operator.parse()
    }

    /// 缺省聚合方式返回 `None`
    pub fn parse_aggregate(&self) -> Option<Result<Aggregate>> {
        self.aggregate
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
    }

    /// 是否仍处于激活静默期
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.active_after.map_or(false, |t| t > now)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self
            .parse_operator()
            .map(|op| op.symbol())
            .unwrap_or("?");
        write!(
            f,
            "{}({}){}{} for 60+{}s",
            self.aggregate.as_deref().unwrap_or(""),
            self.metric,
            symbol,
            self.threshold,
            self.reminder_offset
        )
    }
}

/// 规则引用，指向一个条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub condition_id: String,
}

/// 资源拥有的规则集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rules(BTreeMap<String, RuleRef>);

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rule_id: &str) -> Result<&RuleRef> {
        self.0
            .get(rule_id)
            .ok_or_else(|| AlertError::RuleNotFound(rule_id.to_string()))
    }

    pub fn insert(&mut self, rule_id: impl Into<String>, condition_id: impl Into<String>) {
        self.0.insert(
            rule_id.into(),
            RuleRef {
                condition_id: condition_id.into(),
            },
        );
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleRef)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 被监控的资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// 资源 ID
    pub id: String,

    /// 通知核心服务时使用的密钥
    pub secret: String,

    /// 是否已激活
    #[serde(default)]
    pub activated: bool,

    /// 启用监控的时间
    pub enabled_at: DateTime<Utc>,

    #[serde(default)]
    pub rules: Rules,
}

impl Resource {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            activated: false,
            enabled_at: Utc::now(),
            rules: Rules::new(),
        }
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>, condition_id: impl Into<String>) -> Self {
        self.rules.insert(rule_id, condition_id);
        self
    }

    pub fn activated(mut self) -> Self {
        self.activated = true;
        self
    }
}
