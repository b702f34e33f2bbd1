use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use crate::errors::{Result, ScribeError};

/// 客户端配置，从 config.toml 读取
///
/// Constructed once at startup and passed by reference; there is no
/// process-global instance, so tests can build isolated configs.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Backend base url, e.g. `http://127.0.0.1:8000/api/v1`
    pub base_url: String,
    /// 列表接口分页大小
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// SSE 断线后的最大重连次数
    #[serde(default = "default_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// 上传完成后任务在可见集合中保留的毫秒数
    #[serde(default = "default_retire_grace_ms")]
    pub retire_grace_ms: u64,
}

fn default_page_limit() -> u32 {
    100
}

fn default_reconnect_attempts() -> u32 {
    5
}

fn default_retire_grace_ms() -> u64 {
    500
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_limit: default_page_limit(),
            max_reconnect_attempts: default_reconnect_attempts(),
            retire_grace_ms: default_retire_grace_ms(),
        }
    }

    /// 上传管理器使用的展示期时长
    pub fn retire_grace(&self) -> Duration {
        Duration::from_millis(self.retire_grace_ms)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config_str = std::fs::read_to_string(path)?;
        toml::from_str(&config_str)
            .map_err(|err| ScribeError::ParamError(format!("Can't parse config: {}", err)))
    }
}
