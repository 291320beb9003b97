use thiserror::Error;

/// 指标后端错误类型
#[derive(Error, Debug)]
pub enum TimeSeriesError {
    /// 请求失败（连接、超时等）
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 后端返回非成功状态码
    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// 响应无法解析
    #[error("Malformed backend response: {0}")]
    Parse(String),

    /// 查询参数无效
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// 指标后端结果类型
pub type Result<T> = std::result::Result<T, TimeSeriesError>;
