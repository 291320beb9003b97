use crate::error::{NotifyError, Result};
use crate::message::AlertNotification;
use crate::notifier::Notifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

// ============================================================================
// 核心服务通知
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreNotifierConfig {
    /// 核心服务地址
    pub core_uri: String,

    /// 请求超时
    pub timeout: Duration,

    /// 是否校验 TLS 证书
    pub ssl_verify: bool,
}

impl Default for CoreNotifierConfig {
    fn default() -> Self {
        Self {
            core_uri: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(10),
            ssl_verify: true,
        }
    }
}

/// 通过 `PUT <core_uri>/rules` 通知核心服务
pub struct CoreNotifier {
    config: CoreNotifierConfig,
    client: reqwest::Client,
}

impl CoreNotifier {
    pub fn new(config: CoreNotifierConfig) -> Result<Self> {
        if config.core_uri.is_empty() {
            return Err(NotifyError::Config("core_uri is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.ssl_verify)
            .build()?;

        Ok(Self { config, client })
    }

    fn rules_url(&self) -> String {
        format!("{}/rules", self.config.core_uri.trim_end_matches('/'))
    }
}

#[async_trait]
impl Notifier for CoreNotifier {
    async fn deliver(&self, notification: &AlertNotification) -> Result<()> {
        debug!(
            resource_id = %notification.resource_id,
            rule_id = %notification.rule_id,
            triggered = notification.triggered,
            level = notification.level,
            "Sending notification to core"
        );

        let response = self
            .client
            .put(self.rules_url())
            .query(&notification.to_params())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Core rejected notification");
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &str {
        "core"
    }
}
