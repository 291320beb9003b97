use chrono::{DateTime, Utc};
use flux_logging::{format_duration, format_since};
use flux_timeseries::{MetricsBackend, SeriesQuery};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::aggregator::compute;
use crate::error::{AlertError, Result};
use crate::model::{Aggregate, Condition, Operator, Resource};
use crate::resolver::SeriesResolver;
use crate::scheduler::{NotificationScheduler, NotifyOutcome};
use crate::store::AlertStore;
use crate::tracker::track;

/// 评估器参数
#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    /// 查询窗口
    pub window: Duration,

    /// 激活后条件的静默期
    pub activation_grace: chrono::Duration,

    /// 单次后端调用超时
    pub fetch_timeout: Duration,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(90),
            activation_grace: chrono::Duration::seconds(30),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// 单个资源一轮评估的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceReport {
    pub resource_id: String,
    /// 本轮完成激活
    pub activated: bool,
    pub evaluated: usize,
    pub skipped: usize,
    pub notified: usize,
    pub failed: usize,
}

impl ResourceReport {
    fn new(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            ..Default::default()
        }
    }
}

/// 通过校验、等待评估的条件
struct Candidate {
    condition: Condition,
    operator: Operator,
    aggregate: Aggregate,
}

/// 资源评估器
pub struct ResourceEvaluator {
    store: Arc<dyn AlertStore>,
    backend: Arc<dyn MetricsBackend>,
    scheduler: NotificationScheduler,
    resolver: SeriesResolver,
    settings: EvaluatorSettings,
}

impl ResourceEvaluator {
    pub fn new(
        store: Arc<dyn AlertStore>,
        backend: Arc<dyn MetricsBackend>,
        scheduler: NotificationScheduler,
    ) -> Self {
        Self {
            store,
            backend,
            scheduler,
            resolver: SeriesResolver::default(),
            settings: EvaluatorSettings::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: SeriesResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_settings(mut self, settings: EvaluatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &Arc<dyn AlertStore> {
        &self.store
    }

    /// 评估一个资源，`rule_id` 指定时只评估该规则
    pub async fn check_resource(
        &self,
        resource: &Resource,
        rule_id: Option<&str>,
    ) -> Result<ResourceReport> {
        self.check_resource_at(resource, rule_id, Utc::now()).await
    }

    pub async fn check_resource_at(
        &self,
        resource: &Resource,
        rule_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ResourceReport> {
        let mut report = ResourceReport::new(&resource.id);

        info!(resource_id = %resource.id, "Checking resource");

        if !resource.activated {
            info!(
                resource_id = %resource.id,
                inactive_for = %format_duration(now - resource.enabled_at),
                "Resource is not yet activated"
            );
            if self.check_has_data(&resource.id).await? {
                report.activated = self.activate(&resource.id, now).await?;
            }
            return Ok(report);
        }

        let mut targets = self.gather(resource, rule_id, now, &mut report).await;
        if targets.is_empty() {
            warn!(resource_id = %resource.id, "No rules found");
            return Ok(report);
        }

        let query = SeriesQuery::new(&resource.id, self.settings.window)
            .with_all_series(targets.keys().cloned());

        let data = match tokio::time::timeout(
            self.settings.fetch_timeout,
            self.backend.fetch(&query),
        )
        .await
        {
            Ok(Ok(data)) => data,
            Ok(Err(e)) => {
                warn!(
                    resource_id = %resource.id,
                    backend = self.backend.name(),
                    error = %e,
                    "Metrics fetch failed, skipping resource"
                );
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    resource_id = %resource.id,
                    backend = self.backend.name(),
                    "Metrics fetch timed out, skipping resource"
                );
                return Err(AlertError::timeout(format!(
                    "metrics fetch for {}",
                    resource.id
                )));
            }
        };

        for series in data {
            let candidates = match targets.remove(&series.name) {
                Some(candidates) => candidates,
                None => {
                    warn!(
                        resource_id = %resource.id,
                        series = %series.name,
                        "Backend returned unexpected series"
                    );
                    continue;
                }
            };

            let values = series.values();
            if values.is_empty() {
                for candidate in &candidates {
                    warn!(
                        resource_id = %resource.id,
                        rule_id = %candidate.condition.rule_id,
                        condition = %candidate.condition,
                        "No data for rule"
                    );
                }
                report.skipped += candidates.len();
                continue;
            }

            for candidate in candidates {
                self.check_condition(resource, candidate, &values, now, &mut report)
                    .await;
            }
        }

        for (series, candidates) in targets {
            if self.resolver.is_nodata(&series) {
                // 无数据序列完全缺失说明存储文件不存在，按触发处理
                for candidate in candidates {
                    self.check_condition(resource, candidate, &[1.0], now, &mut report)
                        .await;
                }
            } else {
                for candidate in &candidates {
                    warn!(
                        resource_id = %resource.id,
                        rule_id = %candidate.condition.rule_id,
                        condition = %candidate.condition,
                        series = %series,
                        "Metric not found for rule"
                    );
                }
                report.skipped += candidates.len();
            }
        }

        Ok(report)
    }

    async fn check_has_data(&self, resource_id: &str) -> Result<bool> {
        match tokio::time::timeout(
            self.settings.fetch_timeout,
            self.backend.has_data(resource_id),
        )
        .await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(AlertError::timeout(format!(
                "activation data check for {}",
                resource_id
            ))),
        }
    }

    /// 激活资源并为其所有条件设置静默期
    ///
    /// 在资源锁内重新读取资源，已被其他评估激活时返回 `false`。
    pub async fn activate(&self, resource_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let _lock = self.store.lock(resource_id).await?;

        let mut resource = self.store.get_resource(resource_id).await?;
        if resource.activated {
            debug!(resource_id = %resource_id, "Resource already activated");
            return Ok(false);
        }

        info!(resource_id = %resource_id, "Resource just got activated");

        resource.activated = true;
        self.store.save_resource(&resource).await?;

        let active_after = now + self.settings.activation_grace;
        for (rule_id, rule) in resource.rules.iter() {
            match self.store.get_condition(&rule.condition_id).await {
                Ok(mut condition) => {
                    condition.active_after = Some(active_after);
                    self.store.save_condition(&condition).await?;
                }
                Err(e) if e.is_not_found() => {
                    warn!(
                        resource_id = %resource_id,
                        rule_id = %rule_id,
                        "Condition not found while activating"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(true)
    }

    /// 收集可评估的条件，按序列名分组；单个条件的错误只跳过该条件
    async fn gather(
        &self,
        resource: &Resource,
        rule_id: Option<&str>,
        now: DateTime<Utc>,
        report: &mut ResourceReport,
    ) -> BTreeMap<String, Vec<Candidate>> {
        let rule_ids: Vec<&str> = match rule_id {
            Some(id) => vec![id],
            None => resource.rules.ids().collect(),
        };

        let mut targets: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();

        for rule_id in rule_ids {
            let condition_id = match resource.rules.get(rule_id) {
                Ok(rule) => rule.condition_id.clone(),
                Err(e) => {
                    warn!(resource_id = %resource.id, rule_id = %rule_id, error = %e, "Rule not found");
                    report.skipped += 1;
                    continue;
                }
            };

            let mut condition = match self.store.get_condition(&condition_id).await {
                Ok(condition) => condition,
                Err(e) if e.is_not_found() => {
                    warn!(
                        resource_id = %resource.id,
                        rule_id = %rule_id,
                        "Condition not found, probably rule just got updated. Will check on next run"
                    );
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!(
                        resource_id = %resource.id,
                        rule_id = %rule_id,
                        error = %e,
                        "Failed to load condition"
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let series = match self.resolver.resolve(&condition.metric) {
                Ok(series) => series,
                Err(e) => {
                    error!(resource_id = %resource.id, rule_id = %rule_id, error = %e, "Cannot resolve series");
                    report.skipped += 1;
                    continue;
                }
            };

            let operator = match condition.parse_operator() {
                Ok(operator) => operator,
                Err(e) => {
                    error!(
                        resource_id = %resource.id,
                        rule_id = %rule_id,
                        condition = %condition,
                        error = %e,
                        "Invalid condition"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            let aggregate = match condition.parse_aggregate() {
                None => {
                    warn!(
                        resource_id = %resource.id,
                        rule_id = %rule_id,
                        "Setting aggregate to 'all'"
                    );
                    condition.aggregate = Some(Aggregate::All.to_string());
                    if let Err(e) = self.store.save_condition(&condition).await {
                        error!(
                            resource_id = %resource.id,
                            rule_id = %rule_id,
                            error = %e,
                            "Failed to persist default aggregate"
                        );
                        report.failed += 1;
                        continue;
                    }
                    Aggregate::All
                }
                Some(Ok(aggregate)) => aggregate,
                Some(Err(e)) => {
                    error!(
                        resource_id = %resource.id,
                        rule_id = %rule_id,
                        condition = %condition,
                        error = %e,
                        "Invalid condition"
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            if condition.is_pending(now) {
                info!(
                    resource_id = %resource.id,
                    rule_id = %rule_id,
                    condition = %condition,
                    "Not yet active"
                );
                report.skipped += 1;
                continue;
            }

            targets.entry(series).or_default().push(Candidate {
                condition,
                operator,
                aggregate,
            });
        }

        targets
    }

    /// 求值、更新状态并按需通知，错误只影响当前条件
    async fn check_condition(
        &self,
        resource: &Resource,
        candidate: Candidate,
        values: &[f64],
        now: DateTime<Utc>,
        report: &mut ResourceReport,
    ) {
        let Candidate {
            mut condition,
            operator,
            aggregate,
        } = candidate;

        let (triggered, value) = compute(operator, aggregate, values, condition.threshold);
        report.evaluated += 1;

        if track(&mut condition, triggered, now).is_changed() {
            if let Err(e) = self.store.save_condition(&condition).await {
                error!(
                    resource_id = %resource.id,
                    rule_id = %condition.rule_id,
                    error = %e,
                    "Failed to persist condition state"
                );
                report.failed += 1;
                return;
            }
        }

        info!(
            resource_id = %resource.id,
            rule_id = %condition.rule_id,
            condition = %condition,
            state = condition.state,
            since = %format_since(condition.state_since, now),
            value = value,
            level = condition.notification_level,
            "Rule evaluated"
        );

        match self
            .scheduler
            .maybe_notify(resource, &mut condition, value, now)
            .await
        {
            NotifyOutcome::NotDue => {}
            NotifyOutcome::Delivered { level } => {
                report.notified += 1;
                if let Err(e) = self.store.save_condition(&condition).await {
                    error!(
                        resource_id = %resource.id,
                        rule_id = %condition.rule_id,
                        level = level,
                        error = %e,
                        "Failed to persist notification level"
                    );
                    report.failed += 1;
                }
            }
            NotifyOutcome::Failed(_) => report.failed += 1,
        }
    }
}
