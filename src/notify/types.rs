use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::store::RecordStatus;

/// 事件所属的后端任务类型，决定路由到哪个 store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    Conversion,
    Optimization,
    Transcription,
    Terminate,
}

impl TaskKind {
    pub fn category(&self) -> NotificationCategory {
        match self {
            TaskKind::Conversion | TaskKind::Optimization => NotificationCategory::Files,
            TaskKind::Transcription | TaskKind::Terminate => NotificationCategory::Transcriptions,
        }
    }
}

/// 展示层的分类，与 `TaskKind` 正交
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Info,
    Success,
    Error,
}

/// 通知历史按类别过滤（Files 页签 / Transcriptions 页签）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Files,
    Transcriptions,
}

/// 服务端推送的一条通知，SSE data 字段里的 JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationEvent {
    /// 对应 store 记录的主键（TERMINATE 时是后端 job id）
    pub id: String,
    pub task: TaskKind,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub status: RecordStatus,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: String,
}

/// 一次性的用户提示，由展示层消费后即弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Success { message: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_decode() {
        let json = r#"{
            "id": "f1",
            "task": "CONVERSION",
            "type": "SUCCESS",
            "status": "DONE",
            "completed_at": "2024-01-01T00:00:00Z",
            "message": "Conversion finished"
        }"#;

        let event: NotificationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.task, TaskKind::Conversion);
        assert_eq!(event.kind, NotificationType::Success);
        assert_eq!(event.status, RecordStatus::Done);
        assert!(event.completed_at.is_some());
    }

    #[test]
    fn test_event_decode_without_message() {
        let json = r#"{"id": "t1", "task": "TRANSCRIPTION", "type": "INFO", "status": "QUEUE", "completed_at": null}"#;
        let event: NotificationEvent = serde_json::from_str(json).unwrap();
        assert!(event.message.is_empty());
    }

    #[test]
    fn test_task_categories() {
        assert_eq!(TaskKind::Conversion.category(), NotificationCategory::Files);
        assert_eq!(TaskKind::Optimization.category(), NotificationCategory::Files);
        assert_eq!(
            TaskKind::Transcription.category(),
            NotificationCategory::Transcriptions
        );
        assert_eq!(
            TaskKind::Terminate.category(),
            NotificationCategory::Transcriptions
        );
    }
}
