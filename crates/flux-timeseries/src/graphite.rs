use crate::backend::MetricsBackend;
use crate::error::{Result, TimeSeriesError};
use crate::model::{DataPoint, Series};
use crate::query::SeriesQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Graphite 后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphiteConfig {
    /// Graphite Web 地址，例如 `http://localhost:8080`
    pub uri: String,

    /// 资源序列前缀，完整路径为 `<prefix>-<resource_id>.<series>`
    pub prefix: String,

    /// 单次请求超时
    pub timeout: Duration,

    /// 是否校验 TLS 证书
    pub ssl_verify: bool,
}

impl Default for GraphiteConfig {
    fn default() -> Self {
        Self {
            uri: "http://localhost:8080".to_string(),
            prefix: "mist".to_string(),
            timeout: Duration::from_secs(10),
            ssl_verify: true,
        }
    }
}

/// render 接口返回的单条序列
#[derive(Debug, Deserialize)]
struct RenderItem {
    target: String,
    datapoints: Vec<(Option<f64>, i64)>,
}

/// Graphite render API 客户端
pub struct GraphiteBackend {
    config: GraphiteConfig,
    client: reqwest::Client,
}

impl GraphiteBackend {
    pub fn new(config: GraphiteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.ssl_verify)
            .build()?;

        Ok(Self { config, client })
    }

    /// 资源的序列根路径
    fn head(&self, resource_id: &str) -> String {
        format!("{}-{}", self.config.prefix, resource_id)
    }

    /// 用 alias 包装目标，使返回的序列名与请求名一致
    fn target(&self, resource_id: &str, series: &str) -> String {
        format!("alias({}.{},'{}')", self.head(resource_id), series, series)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.uri.trim_end_matches('/'), path)
    }

    async fn get_json<T>(&self, url: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        debug!(url = %url, "Querying graphite");

        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Graphite returned error response");
            return Err(TimeSeriesError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TimeSeriesError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MetricsBackend for GraphiteBackend {
    async fn fetch(&self, query: &SeriesQuery) -> Result<Vec<Series>> {
        query.validate()?;

        let mut params: Vec<(&str, String)> = query
            .series
            .iter()
            .map(|s| ("target", self.target(&query.resource_id, s)))
            .collect();
        params.push(("from", query.relative_start()));
        params.push(("format", "json".to_string()));

        let items: Vec<RenderItem> = self.get_json(&self.endpoint("render"), &params).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let points = item
                    .datapoints
                    .into_iter()
                    .map(|(value, timestamp)| DataPoint::new(value, timestamp))
                    .collect();
                Series::new(item.target, points)
            })
            .collect())
    }

    async fn has_data(&self, resource_id: &str) -> Result<bool> {
        let params = [("query", format!("{}.*", self.head(resource_id)))];
        let found: Vec<serde_json::Value> =
            self.get_json(&self.endpoint("metrics/find"), &params).await?;
        Ok(!found.is_empty())
    }

    fn name(&self) -> &str {
        "graphite"
    }
}
