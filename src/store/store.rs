use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use crate::api::ApiClient;
use crate::errors::Result;
use super::records::{FileRecord, ListQuery, RecordStatus, TranscriptionRecord};

/// store 里的一条记录：按 id 寻址，接受部分字段合并
pub trait EntityRecord {
    fn id(&self) -> &str;

    /// 合并一次状态更新，只触碰事件携带的字段
    fn apply_status(&mut self, status: RecordStatus, completed_at: Option<DateTime<Utc>>);
}

impl EntityRecord for FileRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply_status(&mut self, status: RecordStatus, completed_at: Option<DateTime<Utc>>) {
        self.status = status;
        if completed_at.is_some() {
            self.completed_at = completed_at;
        }
    }
}

impl EntityRecord for TranscriptionRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply_status(&mut self, status: RecordStatus, completed_at: Option<DateTime<Utc>>) {
        self.status = status;
        if completed_at.is_some() {
            self.completed_at = completed_at;
        }
    }
}

struct StoreState<R> {
    records: Vec<R>,
    last_error: Option<String>,
}

/// 渲染层读取的权威记录列表
///
/// 每次变更在一次写锁内完成，读者只会看到完整的快照。
/// fetch 失败采取 fail-soft：保留旧数据，只记下错误。
pub struct EntityStore<R> {
    state: RwLock<StoreState<R>>,
}

impl<R> Default for EntityStore<R>
where
    R: EntityRecord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R> EntityStore<R>
where
    R: EntityRecord + Clone,
{
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                records: Vec::new(),
                last_error: None,
            }),
        }
    }

    pub async fn snapshot(&self) -> Vec<R> {
        self.state.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<R> {
        self.state
            .read()
            .await
            .records
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    /// 整表替换，fetch 成功后调用
    pub(crate) async fn replace(&self, records: Vec<R>) {
        let mut state = self.state.write().await;
        state.records = records;
        state.last_error = None;
    }

    async fn record_error(&self, message: String) {
        self.state.write().await.last_error = Some(message);
    }

    /// 按 id 做部分合并；id 不存在时静默忽略
    ///
    /// 推送事件可能先于首次 fetch 到达，no-op 容忍这种乱序。
    /// 同一事件应用两次与应用一次结果相同。
    pub async fn reconcile(
        &self,
        id: &str,
        status: RecordStatus,
        completed_at: Option<DateTime<Utc>>,
    ) {
        let mut state = self.state.write().await;
        match state.records.iter_mut().find(|record| record.id() == id) {
            Some(record) => record.apply_status(status, completed_at),
            None => debug!(id, "reconcile for unknown record, ignoring"),
        }
    }

    pub async fn remove(&self, id: &str) {
        self.state.write().await.records.retain(|record| record.id() != id);
    }
}

pub type FileStore = EntityStore<FileRecord>;

impl EntityStore<FileRecord> {
    /// 从列表接口刷新全部记录
    pub async fn fetch(&self, api: &ApiClient, query: ListQuery) -> Result<()> {
        match api.list_files(query).await {
            Ok(records) => {
                self.replace(records).await;
                Ok(())
            }
            Err(err) => {
                self.record_error(err.to_string()).await;
                Err(err)
            }
        }
    }

    /// 服务端确认删除后才移除本地记录
    pub async fn delete(&self, api: &ApiClient, id: &str) -> Result<()> {
        api.delete_file(id).await?;
        self.remove(id).await;
        Ok(())
    }
}

pub type TranscriptionStore = EntityStore<TranscriptionRecord>;

impl EntityStore<TranscriptionRecord> {
    pub async fn fetch(&self, api: &ApiClient, query: ListQuery) -> Result<()> {
        match api.list_transcriptions(query).await {
            Ok(records) => {
                self.replace(records).await;
                Ok(())
            }
            Err(err) => {
                self.record_error(err.to_string()).await;
                Err(err)
            }
        }
    }

    pub async fn terminate(&self, api: &ApiClient, id: &str) -> Result<()> {
        api.terminate_transcription(id).await?;
        self.remove(id).await;
        Ok(())
    }

    /// TERMINATE 事件按后端 job id 匹配：任一 `task_ids` 命中即移除
    pub async fn remove_by_task_id(&self, task_id: &str) {
        self.state
            .write()
            .await
            .records
            .retain(|record| !record.task_ids.iter().any(|candidate| candidate == task_id));
    }

    pub async fn download(&self, api: &ApiClient, id: &str) -> Result<Bytes> {
        api.download_transcription(id).await
    }
}
