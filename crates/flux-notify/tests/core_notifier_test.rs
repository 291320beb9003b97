use chrono::{TimeZone, Utc};
use flux_notify::{AlertNotification, CoreNotifier, CoreNotifierConfig, Notifier, NotifyError};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notifier_for(server: &MockServer, timeout: Duration) -> CoreNotifier {
    CoreNotifier::new(CoreNotifierConfig {
        core_uri: server.uri(),
        timeout,
        ssl_verify: false,
    })
    .unwrap()
}

fn warning() -> AlertNotification {
    AlertNotification {
        resource_id: "machine-1".to_string(),
        secret: "pw".to_string(),
        rule_id: "rule-cpu".to_string(),
        value: 95.0,
        triggered: true,
        since: Utc.timestamp_opt(1_700_000_000, 0).single(),
        level: 0,
        incident_id: Some("inc-42".to_string()),
    }
}

/// 测试通知成功投递
#[tokio::test]
async fn test_deliver_success() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/rules"))
        .and(query_param("machine_uuid", "machine-1"))
        .and(query_param("machine_password", "pw"))
        .and(query_param("rule_id", "rule-cpu"))
        .and(query_param("value", "95"))
        .and(query_param("triggered", "1"))
        .and(query_param("since", "1700000000"))
        .and(query_param("notification_level", "0"))
        .and(query_param("incident_id", "inc-42"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, Duration::from_secs(2));
    assert_ok!(notifier.deliver(&warning()).await);
}

/// 测试核心服务拒绝
#[tokio::test]
async fn test_deliver_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/rules"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad password"))
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, Duration::from_secs(2));
    match notifier.deliver(&warning()).await {
        Err(NotifyError::Rejected { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "bad password");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

/// 测试投递超时
#[tokio::test]
async fn test_deliver_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/rules"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let notifier = notifier_for(&server, Duration::from_millis(200));
    assert_err!(notifier.deliver(&warning()).await);
}

/// 测试连接失败
#[tokio::test]
async fn test_deliver_unreachable() {
    let notifier = CoreNotifier::new(CoreNotifierConfig {
        core_uri: "http://127.0.0.1:9".to_string(),
        timeout: Duration::from_secs(1),
        ssl_verify: true,
    })
    .unwrap();

    assert!(matches!(
        notifier.deliver(&warning()).await,
        Err(NotifyError::Http(_))
    ));
}
