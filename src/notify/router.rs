use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;
use crate::api::ApiClient;
use crate::store::{FileStore, ListQuery, TranscriptionStore};
use super::types::{Alert, NotificationCategory, NotificationEvent, NotificationType, TaskKind};

/// 把推送事件路由进各个 store 的纯路由器
///
/// 自身只保留滚动的通知历史；记录状态归 store 所有，
/// 任务状态归上传管理器所有。
pub struct NotificationRouter {
    api: Arc<ApiClient>,
    files: Arc<FileStore>,
    transcriptions: Arc<TranscriptionStore>,
    query: ListQuery,
    log: RwLock<Vec<NotificationEvent>>,
    alert_tx: broadcast::Sender<Alert>,
}

impl NotificationRouter {
    pub fn new(
        api: Arc<ApiClient>,
        files: Arc<FileStore>,
        transcriptions: Arc<TranscriptionStore>,
        query: ListQuery,
    ) -> Self {
        let (alert_tx, _) = broadcast::channel(64);

        Self {
            api,
            files,
            transcriptions,
            query,
            log: RwLock::new(Vec::new()),
            alert_tx,
        }
    }

    /// 一次性提示的订阅端（SUCCESS/ERROR 弹 toast 用）
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alert_tx.subscribe()
    }

    /// 在后台任务里消费整条事件流
    pub fn run(
        self: Arc<Self>,
        mut event_rx: mpsc::UnboundedReceiver<NotificationEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                self.route(event).await;
            }
        })
    }

    /// 处理一条事件：记历史、分类提示、按任务类型分发
    pub async fn route(&self, event: NotificationEvent) {
        self.log.write().await.push(event.clone());

        match event.kind {
            NotificationType::Success => {
                let _ = self.alert_tx.send(Alert::Success {
                    message: event.message.clone(),
                });
            }
            NotificationType::Error => {
                let _ = self.alert_tx.send(Alert::Error {
                    message: event.message.clone(),
                });
            }
            NotificationType::Info => {
                // INFO 不打扰用户，静默刷新对应列表
                self.refresh(event.task.category()).await;
            }
        }

        match event.task {
            TaskKind::Conversion | TaskKind::Optimization => {
                self.files
                    .reconcile(&event.id, event.status, event.completed_at)
                    .await;
            }
            TaskKind::Transcription => {
                self.transcriptions
                    .reconcile(&event.id, event.status, event.completed_at)
                    .await;
            }
            TaskKind::Terminate => {
                // 事件 id 是后端 job id，按 task_ids 匹配
                self.transcriptions.remove_by_task_id(&event.id).await;
            }
        }
    }

    async fn refresh(&self, category: NotificationCategory) {
        let result = match category {
            NotificationCategory::Files => self.files.fetch(&self.api, self.query).await,
            NotificationCategory::Transcriptions => {
                self.transcriptions.fetch(&self.api, self.query).await
            }
        };

        if let Err(err) = result {
            debug!("silent refresh failed: {}", err);
        }
    }

    /// 本会话收到的全部通知
    pub async fn notifications(&self) -> Vec<NotificationEvent> {
        self.log.read().await.clone()
    }

    /// 按类别过滤的通知历史（Files / Transcriptions 页签）
    pub async fn notifications_for(&self, category: NotificationCategory) -> Vec<NotificationEvent> {
        self.log
            .read()
            .await
            .iter()
            .filter(|event| event.task.category() == category)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use super::*;
    use crate::config::Config;
    use crate::store::{MediaType, RecordStatus, TranscriptionRecord};

    fn router() -> (NotificationRouter, Arc<FileStore>, Arc<TranscriptionStore>) {
        let config = Config::new("http://localhost:1/api/v1");
        let api = Arc::new(ApiClient::new(&config).unwrap());
        let files = Arc::new(FileStore::new());
        let transcriptions = Arc::new(TranscriptionStore::new());
        let router = NotificationRouter::new(
            api,
            files.clone(),
            transcriptions.clone(),
            ListQuery::default(),
        );

        (router, files, transcriptions)
    }

    fn event(id: &str, task: TaskKind, kind: NotificationType) -> NotificationEvent {
        NotificationEvent {
            id: id.to_string(),
            task,
            kind,
            status: RecordStatus::Done,
            completed_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            message: "done".to_string(),
        }
    }

    fn transcription(id: &str, task_ids: &[&str]) -> TranscriptionRecord {
        TranscriptionRecord {
            id: id.to_string(),
            name: String::new(),
            media: MediaType::Audio,
            task_ids: task_ids.iter().map(|s| s.to_string()).collect(),
            language: "en".to_string(),
            priority: Default::default(),
            status: RecordStatus::Processing,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_success_event_emits_alert_and_logs() {
        let (router, _, _) = router();
        let mut alerts = router.subscribe_alerts();

        router
            .route(event("f1", TaskKind::Conversion, NotificationType::Success))
            .await;

        assert_eq!(
            alerts.try_recv().unwrap(),
            Alert::Success { message: "done".to_string() }
        );
        assert_eq!(router.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn test_transcription_event_routes_to_transcription_store() {
        let (router, files, transcriptions) = router();
        transcriptions
            .replace(vec![transcription("t1", &["job-1"])])
            .await;

        router
            .route(event("t1", TaskKind::Transcription, NotificationType::Success))
            .await;

        assert_eq!(
            transcriptions.get("t1").await.unwrap().status,
            RecordStatus::Done
        );
        assert!(files.is_empty().await);
    }

    #[tokio::test]
    async fn test_terminate_matches_task_ids_not_primary_id() {
        let (router, _, transcriptions) = router();
        transcriptions
            .replace(vec![
                transcription("t1", &["job-1", "job-2"]),
                transcription("t2", &["job-9"]),
            ])
            .await;

        router
            .route(event("job-2", TaskKind::Terminate, NotificationType::Error))
            .await;

        let left = transcriptions.snapshot().await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "t2");
    }

    #[tokio::test]
    async fn test_routing_same_event_twice_is_stable() {
        let (router, _, transcriptions) = router();
        transcriptions
            .replace(vec![transcription("t1", &["job-1"])])
            .await;

        let done = event("t1", TaskKind::Transcription, NotificationType::Success);
        router.route(done.clone()).await;
        let once = transcriptions.get("t1").await.unwrap();

        router.route(done).await;
        let twice = transcriptions.get("t1").await.unwrap();

        assert_eq!(once.status, twice.status);
        assert_eq!(once.completed_at, twice.completed_at);
    }

    #[tokio::test]
    async fn test_category_filtering() {
        let (router, _, _) = router();
        router
            .route(event("f1", TaskKind::Conversion, NotificationType::Success))
            .await;
        router
            .route(event("f2", TaskKind::Optimization, NotificationType::Error))
            .await;
        router
            .route(event("t1", TaskKind::Transcription, NotificationType::Success))
            .await;

        let files = router.notifications_for(NotificationCategory::Files).await;
        assert_eq!(files.len(), 2);

        let transcriptions = router
            .notifications_for(NotificationCategory::Transcriptions)
            .await;
        assert_eq!(transcriptions.len(), 1);
        assert_eq!(transcriptions[0].id, "t1");
    }
}
