use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::alertd::AlertdConfig;
use crate::error::{ConfigError, Result};

/// 环境变量前缀，例如 `ALERTD_NOTIFY__CORE_URI`
pub const ENV_PREFIX: &str = "ALERTD";

/// 配置加载器
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    /// 创建配置加载器，`path` 为空时只读取默认值与环境变量
    pub fn new<P: AsRef<Path>>(path: Option<P>) -> Self {
        Self {
            path: path.map(|p| p.as_ref().to_path_buf()),
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 从文件加载，文件不存在时使用默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AlertdConfig> {
        Self::new(Some(path)).load_config()
    }

    /// 加载、合并并校验配置
    pub fn load_config(&self) -> Result<AlertdConfig> {
        let mut builder = Config::builder();

        if let Some(path) = self.path.as_ref().filter(|p| p.exists()) {
            let path = path
                .to_str()
                .ok_or_else(|| ConfigError::invalid("Invalid config path"))?;
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        let config: AlertdConfig = builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}
