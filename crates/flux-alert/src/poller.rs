use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::{AlertError, Result};
use crate::evaluator::{ResourceEvaluator, ResourceReport};

/// 一轮轮询的统计
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// 检查的资源数
    pub checked: usize,
    /// 评估失败（后端错误、超时等）的资源数
    pub failed: usize,
    pub activated: usize,
    pub notified: usize,
    pub elapsed: Duration,
}

/// 本轮结束后应休眠的时长，超出周期时返回 `None`
pub fn sleep_time(period: Duration, elapsed: Duration) -> Option<Duration> {
    period.checked_sub(elapsed).filter(|d| !d.is_zero())
}

/// 告警轮询服务
pub struct AlertService {
    evaluator: Arc<ResourceEvaluator>,
    period: Duration,
    concurrency: usize,
}

impl AlertService {
    pub fn new(evaluator: Arc<ResourceEvaluator>) -> Self {
        Self {
            evaluator,
            period: Duration::from_secs(10),
            concurrency: 4,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 无限循环执行轮询，由进程退出终止
    pub async fn run(&self) {
        info!(
            period_secs = self.period.as_secs(),
            concurrency = self.concurrency,
            "Alert service started"
        );

        loop {
            let started = Instant::now();
            if let Err(e) = self.run_pass().await {
                error!(error = %e, "Evaluation pass failed");
            }
            let elapsed = started.elapsed();

            match sleep_time(self.period, elapsed) {
                Some(delay) => {
                    info!(
                        "Run completed in {:.1} seconds. Sleeping for {:.1} seconds.",
                        elapsed.as_secs_f64(),
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    warn!(
                        "Run completed in {:.1} seconds. Will not sleep because period is {} seconds.",
                        elapsed.as_secs_f64(),
                        self.period.as_secs()
                    );
                }
            }
        }
    }

    /// 对所有资源执行一轮评估，资源间并发受 `concurrency` 限制
    pub async fn run_pass(&self) -> Result<PassReport> {
        let started = Instant::now();
        let resources = self.evaluator.store().list_resources().await?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(resources.len());

        for resource in resources {
            let evaluator = self.evaluator.clone();
            let semaphore = semaphore.clone();

            let task = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AlertError::Cancelled(e.to_string()))?;
                evaluator.check_resource(&resource, None).await
            });
            tasks.push(task);
        }

        let mut report = PassReport::default();
        for task in tasks {
            report.checked += 1;
            match task.await {
                Ok(Ok(resource_report)) => {
                    report.notified += resource_report.notified;
                    if resource_report.activated {
                        report.activated += 1;
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Resource evaluation aborted");
                    report.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Resource evaluation task panicked");
                    report.failed += 1;
                }
            }
        }

        report.elapsed = started.elapsed();
        info!(
            checked = report.checked,
            failed = report.failed,
            activated = report.activated,
            notified = report.notified,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Evaluation pass finished"
        );
        Ok(report)
    }

    /// 立即重新评估某个资源的单条规则
    pub async fn recheck(&self, resource_id: &str, rule_id: &str) -> Result<ResourceReport> {
        let resource = self.evaluator.store().get_resource(resource_id).await?;
        self.evaluator.check_resource(&resource, Some(rule_id)).await
    }
}
