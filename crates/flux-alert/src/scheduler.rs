use chrono::{DateTime, Duration, Utc};
use flux_notify::{AlertNotification, Notifier};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::AlertError;
use crate::model::{Condition, Resource};
use crate::units::UnitTable;

/// 默认提醒间隔（秒）
pub const DEFAULT_REMINDERS: [u64; 4] = [0, 60, 300, 600];

/// 待发送的通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Warning,
    Ok,
}

/// 一次调度的结果
#[derive(Debug)]
pub enum NotifyOutcome {
    /// 未到发送时间
    NotDue,
    /// 已送达，条件级别已推进到 `level`
    Delivered { level: u32 },
    /// 发送失败或超时，级别保持不变，下一轮重试
    Failed(AlertError),
}

/// 判断当前是否需要发送通知
///
/// 触发状态下按提醒列表逐级发送；没有 `state_since` 的触发条件视为已持续无限久。
/// 恢复状态下仅当级别为 0 时发送一次恢复通知。
/// 等待时间溢出时不发送。
pub fn due_notification(
    condition: &Condition,
    default_reminders: &[u64],
    now: DateTime<Utc>,
) -> Option<NotificationKind> {
    if !condition.state {
        return (condition.notification_level == 0).then_some(NotificationKind::Ok);
    }

    let reminders = if condition.reminder_list.is_empty() {
        default_reminders
    } else {
        condition.reminder_list.as_slice()
    };

    let wait = reminders.get(condition.notification_level as usize)?;

    // 超出可表示范围的等待时间视为永不到期
    let due = wait
        .checked_add(condition.reminder_offset)
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(Duration::try_seconds)?;

    match condition.state_since {
        Some(since) if now - since < due => None,
        _ => Some(NotificationKind::Warning),
    }
}

/// 通知调度器
pub struct NotificationScheduler {
    notifier: Arc<dyn Notifier>,
    units: UnitTable,
    default_reminders: Vec<u64>,
    timeout: std::time::Duration,
}

impl NotificationScheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            units: UnitTable::default(),
            default_reminders: DEFAULT_REMINDERS.to_vec(),
            timeout: std::time::Duration::from_secs(10),
        }
    }

    pub fn with_units(mut self, units: UnitTable) -> Self {
        self.units = units;
        self
    }

    pub fn with_default_reminders(mut self, reminders: Vec<u64>) -> Self {
        self.default_reminders = reminders;
        self
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 构造通知内容，值按单位表换算
    pub fn build_notification(
        &self,
        resource: &Resource,
        condition: &Condition,
        value: f64,
    ) -> AlertNotification {
        AlertNotification {
            resource_id: resource.id.clone(),
            secret: resource.secret.clone(),
            rule_id: condition.rule_id.clone(),
            value: self.units.convert(&condition.metric, value),
            triggered: condition.state,
            since: condition.state_since,
            level: condition.notification_level,
            incident_id: condition.incident_id.clone(),
        }
    }

    /// 必要时发送通知，成功后推进条件的通知级别（调用方负责持久化）
    pub async fn maybe_notify(
        &self,
        resource: &Resource,
        condition: &mut Condition,
        value: f64,
        now: DateTime<Utc>,
    ) -> NotifyOutcome {
        let kind = match due_notification(condition, &self.default_reminders, now) {
            Some(kind) => kind,
            None => return NotifyOutcome::NotDue,
        };

        info!(
            resource_id = %resource.id,
            rule_id = %condition.rule_id,
            level = condition.notification_level,
            kind = ?kind,
            "Sending notification"
        );

        let notification = self.build_notification(resource, condition, value);
        let result = tokio::time::timeout(self.timeout, self.notifier.deliver(&notification)).await;

        match result {
            Ok(Ok(())) => {
                condition.notification_level = match kind {
                    NotificationKind::Warning => condition.notification_level + 1,
                    NotificationKind::Ok => 1,
                };
                NotifyOutcome::Delivered {
                    level: condition.notification_level,
                }
            }
            Ok(Err(e)) => {
                error!(
                    resource_id = %resource.id,
                    rule_id = %condition.rule_id,
                    notifier = self.notifier.name(),
                    error = %e,
                    "Notification delivery failed"
                );
                NotifyOutcome::Failed(AlertError::Delivery(e))
            }
            Err(_) => {
                error!(
                    resource_id = %resource.id,
                    rule_id = %condition.rule_id,
                    notifier = self.notifier.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Notification delivery timed out"
                );
                NotifyOutcome::Failed(AlertError::timeout(format!(
                    "notification for {}",
                    condition.rule_id
                )))
            }
        }
    }
}
