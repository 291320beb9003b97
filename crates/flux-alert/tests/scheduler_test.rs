mod common;

use chrono::Utc;
use common::RecordingNotifier;
use flux_alert::{
    Aggregate, AlertError, Condition, NotificationScheduler, NotifyOutcome, Operator, Resource,
};
use std::time::Duration;

fn triggered() -> (Resource, Condition) {
    let resource = Resource::new("m1", "pw").with_rule("r1", "c1").activated();
    let mut condition = Condition::new("c1", "m1", "r1", "cpu", Operator::Gt, Aggregate::All, 80.0);
    condition.state = true;
    condition.state_since = Some(Utc::now());
    (resource, condition)
}

/// 核心服务拒绝时返回投递错误
#[tokio::test]
async fn test_rejected_delivery_reports_error() {
    let notifier = RecordingNotifier::new();
    notifier.set_failing(true);
    let scheduler = NotificationScheduler::new(notifier.clone());
    let (resource, mut condition) = triggered();

    let outcome = scheduler
        .maybe_notify(&resource, &mut condition, 90.0, Utc::now())
        .await;

    assert!(matches!(outcome, NotifyOutcome::Failed(AlertError::Delivery(_))));
    assert_eq!(condition.notification_level, 0);
}

/// 发送超时返回超时错误
#[tokio::test]
async fn test_hanging_delivery_times_out() {
    let notifier = RecordingNotifier::new();
    notifier.set_hanging(true);
    let scheduler =
        NotificationScheduler::new(notifier.clone()).with_timeout(Duration::from_millis(50));
    let (resource, mut condition) = triggered();

    let outcome = scheduler
        .maybe_notify(&resource, &mut condition, 90.0, Utc::now())
        .await;

    assert!(matches!(outcome, NotifyOutcome::Failed(AlertError::Timeout(_))));
    assert_eq!(condition.notification_level, 0);
    assert_eq!(notifier.attempts(), 1);
}

/// 送达后推进级别
#[tokio::test]
async fn test_delivered_advances_level() {
    let notifier = RecordingNotifier::new();
    let scheduler = NotificationScheduler::new(notifier.clone());
    let (resource, mut condition) = triggered();

    let outcome = scheduler
        .maybe_notify(&resource, &mut condition, 90.0, Utc::now())
        .await;

    assert!(matches!(outcome, NotifyOutcome::Delivered { level: 1 }));
    assert_eq!(notifier.sent().len(), 1);
}
