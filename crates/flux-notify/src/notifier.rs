use crate::error::Result;
use crate::message::AlertNotification;
use async_trait::async_trait;

/// 通知器 trait
///
/// 投递被视为幂等，失败后由下一轮评估重试
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 投递一条告警通知
    async fn deliver(&self, notification: &AlertNotification) -> Result<()>;

    /// 通知器名称
    fn name(&self) -> &str;
}
