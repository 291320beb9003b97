#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flux_alert::{
    AlertError, AlertStore, Condition, EvaluatorSettings, MemoryStore, NotificationScheduler, Resource, ResourceEvaluator,
    ResourceLock,
};
use flux_notify::{AlertNotification, Notifier, NotifyError};
use flux_timeseries::{DataPoint, MetricsBackend, Series, SeriesQuery, TimeSeriesError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 按序列名返回预设数据的后端
#[derive(Default)]
pub struct ScriptedBackend {
    series: Mutex<HashMap<String, Vec<Option<f64>>>>,
    extra: Mutex<Vec<Series>>,
    failing: Mutex<HashSet<String>>,
    has_data: AtomicBool,
    pub fetches: AtomicUsize,
    hanging: AtomicBool,
    pub data_checks: AtomicUsize,
    pub last_query: Mutex<Option<SeriesQuery>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_series(&self, name: &str, values: &[Option<f64>]) {
        self.series
            .lock()
            .unwrap()
            .insert(name.to_string(), values.to_vec());
    }

    pub fn set_values(&self, name: &str, values: &[f64]) {
        let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        self.set_series(name, &values);
    }

    /// 无论是否请求都会返回的序列
    pub fn push_unrequested(&self, name: &str, values: &[f64]) {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(Some(*v), i as i64))
            .collect();
        self.extra.lock().unwrap().push(Series::new(name, points));
    }

    pub fn fail_for(&self, resource_id: &str) {
        self.failing.lock().unwrap().insert(resource_id.to_string());
    }

    /// 之后的所有请求永不返回
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub fn set_has_data(&self, has_data: bool) {
        self.has_data.store(has_data, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsBackend for ScriptedBackend {
    async fn fetch(&self, query: &SeriesQuery) -> flux_timeseries::Result<Vec<Series>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());

        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if self.failing.lock().unwrap().contains(&query.resource_id) {
            return Err(TimeSeriesError::Status {
                status: 500,
                body: "graphite down".to_string(),
            });
        }

        let series = self.series.lock().unwrap();
        let mut result: Vec<Series> = query
            .series
            .iter()
            .filter_map(|name| {
                series.get(name).map(|values| {
                    let points = values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| DataPoint::new(*v, 1_700_000_000 + i as i64 * 10))
                        .collect();
                    Series::new(name.clone(), points)
                })
            })
            .collect();
        result.extend(self.extra.lock().unwrap().iter().cloned());
        Ok(result)
    }

    async fn has_data(&self, _resource_id: &str) -> flux_timeseries::Result<bool> {
        self.data_checks.fetch_add(1, Ordering::SeqCst);
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        // 让并发的检查交错执行
        tokio::task::yield_now().await;
        Ok(self.has_data.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 记录所有通知，可切换为失败
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<AlertNotification>>,
    pub attempts: AtomicUsize,
    failing: AtomicBool,
    hanging: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<AlertNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notification: &AlertNotification) -> flux_notify::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                status: 503,
                body: "core unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 统计写操作次数的存储包装
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub resource_saves: AtomicUsize,
    pub condition_saves: AtomicUsize,
    broken_loads: Mutex<HashSet<String>>,
    broken_saves: Mutex<HashSet<String>>,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 读取该条件时返回存储错误
    pub fn break_loads_for(&self, condition_id: &str) {
        self.broken_loads
            .lock()
            .unwrap()
            .insert(condition_id.to_string());
    }

    /// 写入该条件时返回存储错误
    pub fn break_saves_for(&self, condition_id: &str) {
        self.broken_saves
            .lock()
            .unwrap()
            .insert(condition_id.to_string());
    }

    pub fn resource_saves(&self) -> usize {
        self.resource_saves.load(Ordering::SeqCst)
    }

    pub fn condition_saves(&self) -> usize {
        self.condition_saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertStore for CountingStore {
    async fn get_resource(&self, resource_id: &str) -> flux_alert::Result<Resource> {
        self.inner.get_resource(resource_id).await
    }

    async fn save_resource(&self, resource: &Resource) -> flux_alert::Result<()> {
        self.resource_saves.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.save_resource(resource).await
    }

    async fn list_resources(&self) -> flux_alert::Result<Vec<Resource>> {
        self.inner.list_resources().await
    }

    async fn get_condition(&self, condition_id: &str) -> flux_alert::Result<Condition> {
        if self.broken_loads.lock().unwrap().contains(condition_id) {
            return Err(AlertError::store(format!("cannot read {}", condition_id)));
        }
        self.inner.get_condition(condition_id).await
    }

    async fn save_condition(&self, condition: &Condition) -> flux_alert::Result<()> {
        self.condition_saves.fetch_add(1, Ordering::SeqCst);
        if self.broken_saves.lock().unwrap().contains(&condition.id) {
            return Err(AlertError::store(format!("cannot write {}", condition.id)));
        }
        self.inner.save_condition(condition).await
    }

    async fn lock(&self, resource_id: &str) -> flux_alert::Result<ResourceLock> {
        self.inner.lock(resource_id).await
    }
}

pub struct Harness {
    pub store: Arc<CountingStore>,
    pub backend: Arc<ScriptedBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub evaluator: Arc<ResourceEvaluator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(10), Duration::from_secs(10))
    }

    /// 指定后端调用与通知发送的超时
    pub fn with_timeouts(fetch_timeout: Duration, delivery_timeout: Duration) -> Self {
        let store = CountingStore::new();
        let backend = ScriptedBackend::new();
        let notifier = RecordingNotifier::new();
        let scheduler =
            NotificationScheduler::new(notifier.clone()).with_timeout(delivery_timeout);
        let settings = EvaluatorSettings {
            fetch_timeout,
            ..Default::default()
        };
        let evaluator = Arc::new(
            ResourceEvaluator::new(store.clone(), backend.clone(), scheduler)
                .with_settings(settings),
        );

        Self {
            store,
            backend,
            notifier,
            evaluator,
        }
    }

    pub async fn add(&self, resource: &Resource, conditions: &[Condition]) {
        self.store.save_resource(resource).await.unwrap();
        for condition in conditions {
            self.store.save_condition(condition).await.unwrap();
        }
    }

    pub async fn condition(&self, id: &str) -> Condition {
        self.store.get_condition(id).await.unwrap()
    }

    pub async fn resource(&self, id: &str) -> Resource {
        self.store.get_resource(id).await.unwrap()
    }

    pub async fn check_at(&self, resource_id: &str, now: DateTime<Utc>) -> flux_alert::ResourceReport {
        let resource = self.resource(resource_id).await;
        self.evaluator
            .check_resource_at(&resource, None, now)
            .await
            .unwrap()
    }
}
