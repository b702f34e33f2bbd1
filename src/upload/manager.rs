use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use super::manager_worker::{FilesRefresh, UploadManagerWorker};
use super::task::UploadTask;
use super::transport::UploadTransport;
use super::types::{ManagerCommand, UploadEvent, UploadId, UploadSpec};
use crate::errors::{Result, ScribeError};

#[derive(Clone)]
pub struct UploadManager {
    command_tx: mpsc::Sender<ManagerCommand>,
    event_tx: broadcast::Sender<UploadEvent>,
}

/// 上传管理器句柄 - 包含管理器和工作任务
pub struct UploadManagerHandle {
    pub manager: UploadManager,
    pub worker_handle: JoinHandle<()>,
}

impl UploadManagerHandle {
    /// 放掉命令通道并等 worker 退出
    pub async fn shutdown(self) -> Result<()> {
        drop(self.manager);
        self.worker_handle.await
            .map_err(|err| ScribeError::InternalError(format!("Worker panic: {}", err)))
    }
}

impl UploadManager {
    pub fn new(
        transport: Arc<dyn UploadTransport>,
        retire_grace: Duration,
        refresh: Option<FilesRefresh>,
    ) -> UploadManagerHandle {
        let (command_tx, command_rx) = mpsc::channel(100);
        // 最大缓存 256 个事件
        let (event_tx, _) = broadcast::channel(256);

        let worker_handle = tokio::spawn(UploadManagerWorker::run(
            transport,
            retire_grace,
            refresh,
            command_rx,
            event_tx.clone(),
        ));

        let manager = Self {
            command_tx,
            event_tx,
        };

        UploadManagerHandle {
            manager,
            worker_handle,
        }
    }

    /// 订阅任务生命周期事件
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.event_tx.subscribe()
    }

    /// Enqueue an upload and start it immediately
    pub async fn enqueue(&self, spec: UploadSpec) -> Result<UploadId> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ManagerCommand::Enqueue {
                spec,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ScribeError::ManagerShutdown)?;

        // 等待响应
        reply_rx
            .await
            .map_err(|err| ScribeError::internal_error(err.to_string()))?
    }

    /// Cancel an in-flight upload; no-op on terminal tasks
    pub async fn cancel(&self, upload_id: UploadId) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ManagerCommand::Cancel {
                upload_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ScribeError::ManagerShutdown)?;

        reply_rx
            .await
            .map_err(|err| ScribeError::internal_error(err.to_string()))?
    }

    /// Remove a terminal task from the visible set
    pub async fn retire(&self, upload_id: UploadId) -> Result<()> {
        self.command_tx
            .send(ManagerCommand::Retire { upload_id })
            .await
            .map_err(|_| ScribeError::ManagerShutdown)
    }

    pub async fn task(&self, upload_id: UploadId) -> Result<Option<UploadTask>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ManagerCommand::GetTask {
                upload_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ScribeError::ManagerShutdown)?;

        reply_rx
            .await
            .map_err(|err| ScribeError::internal_error(err.to_string()))
    }

    pub async fn tasks(&self) -> Result<Vec<UploadTask>> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(ManagerCommand::GetAllTasks { reply: reply_tx })
            .await
            .map_err(|_| ScribeError::ManagerShutdown)?;

        reply_rx
            .await
            .map_err(|err| ScribeError::internal_error(err.to_string()))
    }
}
