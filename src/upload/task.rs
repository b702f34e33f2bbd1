use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::types::{UploadId, UploadMethod};

/// 取消时固定的错误文案
pub const CANCELLED_MESSAGE: &str = "Upload cancelled";

/// 派生状态，不单独存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum UploadStatus {
    InFlight,
    Completed,
    Failed,
}

/// 一次后台上传的纯数据记录
///
/// 渲染层拿到的就是这个结构，核心不持有任何可渲染对象。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTask {
    pub id: UploadId,
    pub url: String,
    pub method: UploadMethod,
    pub display_name: String,
    /// 0–100，`floor(bytes_sent / bytes_total * 100)`
    pub progress: u8,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UploadTask {
    pub fn new(id: UploadId, url: String, method: UploadMethod, display_name: String) -> Self {
        Self {
            id,
            url,
            method,
            display_name,
            progress: 0,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn status(&self) -> UploadStatus {
        if self.error.is_some() {
            UploadStatus::Failed
        } else if self.progress >= 100 {
            UploadStatus::Completed
        } else {
            UploadStatus::InFlight
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status() != UploadStatus::InFlight
    }

    /// 单任务内进度只增不减，乱序到达的旧值被丢弃
    pub fn advance_progress(&mut self, progress: u8) -> bool {
        let clamped = progress.min(100);
        if clamped > self.progress {
            self.progress = clamped;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> UploadTask {
        UploadTask::new(
            UploadId::new(),
            "http://localhost/files".to_string(),
            UploadMethod::Post,
            "song.mp3".to_string(),
        )
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut task = task();
        assert!(task.advance_progress(40));
        assert!(!task.advance_progress(30));
        assert_eq!(task.progress, 40);
        assert!(task.advance_progress(100));
        assert!(!task.advance_progress(110));
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn test_derived_status() {
        let mut completed = task();
        assert_eq!(completed.status(), UploadStatus::InFlight);

        completed.advance_progress(100);
        assert_eq!(completed.status(), UploadStatus::Completed);

        let mut failed = task();
        failed.advance_progress(40);
        failed.error = Some(CANCELLED_MESSAGE.to_string());
        assert_eq!(failed.status(), UploadStatus::Failed);
    }
}
