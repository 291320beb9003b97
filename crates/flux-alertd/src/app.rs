use anyhow::{Context, Result};
use flux_alert::{
    AlertService, AlertStore, EvaluatorSettings, FileStore, NotificationScheduler,
    ResourceEvaluator, SeriesResolver, UnitTable,
};
use flux_config::AlertdConfig;
use flux_notify::{CoreNotifier, CoreNotifierConfig};
use flux_timeseries::{GraphiteBackend, GraphiteConfig};
use std::sync::Arc;
use tracing::info;

/// 根据配置组装告警服务
pub async fn build_service(config: &AlertdConfig) -> Result<AlertService> {
    let backend = GraphiteBackend::new(GraphiteConfig {
        uri: config.metrics.uri.clone(),
        prefix: config.metrics.prefix.clone(),
        timeout: config.metrics.timeout(),
        ssl_verify: config.metrics.ssl_verify,
    })
    .context("failed to create metrics backend")?;

    let notifier = CoreNotifier::new(CoreNotifierConfig {
        core_uri: config.notify.core_uri.clone(),
        timeout: config.notify.timeout(),
        ssl_verify: config.notify.ssl_verify,
    })
    .context("failed to create core notifier")?;

    let store: Arc<dyn AlertStore> = Arc::new(
        FileStore::open(&config.store.path)
            .await
            .with_context(|| format!("failed to open store {:?}", config.store.path))?,
    );

    info!(
        metrics_uri = %config.metrics.uri,
        core_uri = %config.notify.core_uri,
        store = ?config.store.path,
        "Alert service components initialized"
    );

    let scheduler = NotificationScheduler::new(Arc::new(notifier))
        .with_units(UnitTable::new(config.alert.unit_divisors.clone()))
        .with_default_reminders(config.alert.reminder_list.clone())
        .with_timeout(config.notify.timeout());

    let settings = EvaluatorSettings {
        window: config.metrics.window(),
        activation_grace: chrono::Duration::seconds(config.alert.activation_grace_secs as i64),
        fetch_timeout: config.metrics.timeout(),
    };

    let evaluator = ResourceEvaluator::new(store, Arc::new(backend), scheduler)
        .with_resolver(SeriesResolver::new(
            config.alert.series_aliases.clone(),
            config.alert.nodata_target.clone(),
        ))
        .with_settings(settings);

    Ok(AlertService::new(Arc::new(evaluator))
        .with_period(config.poll.period())
        .with_concurrency(config.poll.concurrency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_build_service_with_empty_store() {
        let dir = tempdir().unwrap();
        let mut config = AlertdConfig::default();
        config.store.path = dir.path().join("alertd.json");

        let service = build_service(&config).await.unwrap();
        let report = service.run_pass().await.unwrap();

        assert_eq!(report.checked, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_build_service_rejects_corrupt_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("alertd.json");
        std::fs::write(&path, "garbage").unwrap();

        let mut config = AlertdConfig::default();
        config.store.path = path;

        assert!(build_service(&config).await.is_err());
    }
}
