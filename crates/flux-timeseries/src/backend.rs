use crate::error::Result;
use crate::model::Series;
use crate::query::SeriesQuery;
use async_trait::async_trait;

/// 指标后端 trait
///
/// 告警评估只依赖这两个操作，具体存储（Graphite 等）由实现决定
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// 批量获取序列，返回顺序与请求无关，按名称回配
    async fn fetch(&self, query: &SeriesQuery) -> Result<Vec<Series>>;

    /// 检查资源是否已有任何监控数据
    async fn has_data(&self, resource_id: &str) -> Result<bool>;

    fn name(&self) -> &str;
}
