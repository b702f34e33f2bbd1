use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::config::Config;

/// 后端记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Queue,
    Processing,
    Done,
    Error,
}

impl RecordStatus {
    /// 是否为终态（completed_at 仅在终态下有值）
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Done | RecordStatus::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sort {
    Asc,
    Desc,
}

impl Sort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sort::Asc => "ASC",
            Sort::Desc => "DESC",
        }
    }
}

/// 列表接口的分页参数
#[derive(Debug, Clone, Copy)]
pub struct ListQuery {
    pub limit: u32,
    pub offset: u32,
    pub sort: Sort,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            sort: Sort::Desc,
        }
    }
}

impl From<&Config> for ListQuery {
    fn from(config: &Config) -> Self {
        Self {
            limit: config.page_limit,
            ..Self::default()
        }
    }
}

/// 列表接口的响应信封：`{ "data": [...] }`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
}

/// 服务端已知的媒体文件记录
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub media: MediaType,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 转写任务记录
///
/// 一条转写记录可能对应多个后端 job id（转换、优化等），TERMINATE
/// 事件按 `task_ids` 匹配而不是按主键。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptionRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub media: MediaType,
    #[serde(default)]
    pub task_ids: Vec<String>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
