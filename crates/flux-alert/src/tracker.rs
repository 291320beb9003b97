use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::model::Condition;

/// 一次评估引起的状态变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 状态未变
    Unchanged,
    /// CLEARED -> TRIGGERED
    Triggered,
    /// TRIGGERED -> CLEARED
    Cleared,
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

/// 根据本轮结果更新条件状态，每个条件每轮只调用一次
///
/// 状态翻转时记录 `state_since`。恢复时若从未发送过告警（级别为 0），
/// 级别置 1 以抑制恢复通知；其他翻转将级别清零。
/// 进入触发状态时分配新的事件 ID，恢复时保留以便关联。
pub fn track(condition: &mut Condition, triggered: bool, now: DateTime<Utc>) -> Transition {
    if triggered == condition.state {
        return Transition::Unchanged;
    }

    condition.state = triggered;
    condition.state_since = Some(now);

    if !triggered && condition.notification_level == 0 {
        condition.notification_level = 1;
    } else {
        condition.notification_level = 0;
    }

    if triggered {
        let incident_id = Uuid::new_v4().to_string();
        debug!(
            condition_id = %condition.id,
            incident_id = %incident_id,
            "Opening new incident"
        );
        condition.incident_id = Some(incident_id);
        Transition::Triggered
    } else {
        Transition::Cleared
    }
}
