use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use crate::api::ApiClient;
use crate::errors::{Result, ScribeError};
use crate::store::{FileStore, ListQuery};
use super::task::{CANCELLED_MESSAGE, UploadTask};
use super::transport::UploadTransport;
use super::worker::UploadWorker;
use super::types::{ManagerCommand, UploadEvent, UploadId, UploadSpec};

/// 入列时顺手刷新 Files store 的依赖
///
/// 刷新是 best-effort 的：它可能与权威的推送事件赛跑，双方都是
/// 按 id 的幂等写入，后到者胜出即可。
#[derive(Clone)]
pub struct FilesRefresh {
    pub api: Arc<ApiClient>,
    pub store: Arc<FileStore>,
    pub query: ListQuery,
}

struct TaskHandle {
    task: UploadTask,
    cancellation_token: Option<CancellationToken>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

pub struct UploadManagerWorker {
    transport: Arc<dyn UploadTransport>,
    tasks: HashMap<UploadId, TaskHandle>,
    retire_grace: Duration,
    refresh: Option<FilesRefresh>,

    event_tx: broadcast::Sender<UploadEvent>,
    progress_tx: mpsc::UnboundedSender<(UploadId, u8)>,
    progress_rx: mpsc::UnboundedReceiver<(UploadId, u8)>,
    task_completion_tx: mpsc::UnboundedSender<UploadId>,
    task_completion_rx: mpsc::UnboundedReceiver<UploadId>,
    // 展示期结束后的延迟退休回路
    retire_tx: mpsc::UnboundedSender<UploadId>,
    retire_rx: mpsc::UnboundedReceiver<UploadId>,
}

impl UploadManagerWorker {
    pub(crate) async fn run(
        transport: Arc<dyn UploadTransport>,
        retire_grace: Duration,
        refresh: Option<FilesRefresh>,
        mut command_rx: mpsc::Receiver<ManagerCommand>,
        event_tx: broadcast::Sender<UploadEvent>,
    ) {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (task_completion_tx, task_completion_rx) = mpsc::unbounded_channel();
        let (retire_tx, retire_rx) = mpsc::unbounded_channel();
        let mut worker = Self {
            transport,
            tasks: HashMap::new(),
            retire_grace,
            refresh,
            event_tx,
            progress_tx,
            progress_rx,
            task_completion_tx,
            task_completion_rx,
            retire_tx,
            retire_rx,
        };

        // 主事件循环：命令、进度、完成三路消息逐条处理，
        // 状态变更之间不存在并发
        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(command) => worker.handle_command(command).await,
                        // 所有管理器句柄都已释放
                        None => break,
                    }
                }
                Some((upload_id, progress)) = worker.progress_rx.recv() => {
                    worker.handle_progress(upload_id, progress);
                }
                Some(upload_id) = worker.task_completion_rx.recv() => {
                    worker.handle_task_completion(upload_id).await;
                }
                Some(upload_id) = worker.retire_rx.recv() => {
                    worker.retire(upload_id);
                }
            }
        }

        // 退出前中止所有在途传输
        for handle in worker.tasks.values() {
            if let Some(token) = &handle.cancellation_token {
                token.cancel();
            }
        }
    }

    async fn handle_command(&mut self, command: ManagerCommand) {
        match command {
            ManagerCommand::Enqueue { spec, reply } => {
                let result = self.enqueue(spec);
                let _ = reply.send(result);
            }
            ManagerCommand::Cancel { upload_id, reply } => {
                let result = self.cancel(upload_id);
                let _ = reply.send(result);
            }
            ManagerCommand::Retire { upload_id } => {
                self.retire(upload_id);
            }
            ManagerCommand::GetTask { upload_id, reply } => {
                let task = self.tasks
                    .get(&upload_id)
                    .map(|handle| handle.task.clone());
                let _ = reply.send(task);
            }
            ManagerCommand::GetAllTasks { reply } => {
                let tasks: Vec<_> = self.tasks
                    .values()
                    .map(|handle| handle.task.clone())
                    .collect();
                let _ = reply.send(tasks);
            }
        }
    }

    /// 创建任务并立即开始传输
    fn enqueue(&mut self, spec: UploadSpec) -> Result<UploadId> {
        if spec.url.is_empty() {
            return Err(ScribeError::ParamError("Upload url is empty".to_string()));
        }

        let upload_id = UploadId::new();
        let task = UploadTask::new(
            upload_id,
            spec.url.clone(),
            spec.method,
            spec.display_name.clone(),
        );

        let cancellation_token = CancellationToken::new();
        let upload_worker = UploadWorker {
            transport: self.transport.clone(),
            cancellation_token: cancellation_token.clone(),
        };

        // 每个任务一条进度通道，汇聚到共享的 (id, 百分比) 通道
        let (task_progress_tx, mut task_progress_rx) = mpsc::unbounded_channel();
        let progress_tx = self.progress_tx.clone();
        tokio::spawn(async move {
            while let Some(progress) = task_progress_rx.recv().await {
                let _ = progress_tx.send((upload_id, progress));
            }
        });

        let completion_tx = self.task_completion_tx.clone();
        let join_handle = tokio::spawn(async move {
            let result = upload_worker.run(spec, task_progress_tx).await;
            // 通知完成
            let _ = completion_tx.send(upload_id);
            result
        });

        self.tasks.insert(upload_id, TaskHandle {
            task,
            cancellation_token: Some(cancellation_token),
            join_handle: Some(join_handle),
        });

        let _ = self.event_tx.send(UploadEvent::Added { upload_id });

        // 上传记录很快会出现在服务端列表里，顺手刷新一次。
        // 结果无关紧要，权威状态靠推送事件收敛。
        if let Some(refresh) = self.refresh.clone() {
            tokio::spawn(async move {
                if let Err(err) = refresh.store.fetch(&refresh.api, refresh.query).await {
                    debug!("post-enqueue refresh failed: {}", err);
                }
            });
        }

        Ok(upload_id)
    }

    /// 中止在途任务；终态或未知任务直接返回 Ok
    fn cancel(&mut self, upload_id: UploadId) -> Result<()> {
        let handle = match self.tasks.get_mut(&upload_id) {
            Some(handle) => handle,
            None => return Ok(()),
        };

        if handle.task.is_terminal() {
            return Ok(());
        }

        // 要求传输中止，但不等待结果：终态立即生效
        if let Some(token) = handle.cancellation_token.take() {
            token.cancel();
        }

        handle.task.error = Some(CANCELLED_MESSAGE.to_string());
        handle.task.completed_at = Some(Utc::now());

        let _ = self.event_tx.send(UploadEvent::Failed {
            upload_id,
            error: CANCELLED_MESSAGE.to_string(),
        });

        // 出错的任务不保留展示期
        self.retire(upload_id);

        Ok(())
    }

    /// 从可见集合中移除终态任务
    fn retire(&mut self, upload_id: UploadId) {
        let is_terminal = self.tasks
            .get(&upload_id)
            .map(|handle| handle.task.is_terminal())
            .unwrap_or(false);

        if is_terminal {
            self.tasks.remove(&upload_id);
            let _ = self.event_tx.send(UploadEvent::Retired { upload_id });
        }
    }

    fn handle_progress(&mut self, upload_id: UploadId, progress: u8) {
        let handle = match self.tasks.get_mut(&upload_id) {
            Some(handle) => handle,
            None => return,
        };

        if handle.task.is_terminal() {
            return;
        }

        if handle.task.advance_progress(progress) {
            let _ = self.event_tx.send(UploadEvent::Progress {
                upload_id,
                progress: handle.task.progress,
            });
        }
    }

    async fn handle_task_completion(&mut self, upload_id: UploadId) {
        let handle = match self.tasks.get_mut(&upload_id) {
            // 已取消并退休的任务，迟到的完成通知直接丢弃
            None => return,
            Some(handle) => handle,
        };

        let join_handle = match handle.join_handle.take() {
            Some(join_handle) => join_handle,
            None => return,
        };

        match join_handle.await {
            Ok(Ok(())) => {
                // 成功即 100，即使传输层最后一跳没报满
                if handle.task.advance_progress(100) {
                    let _ = self.event_tx.send(UploadEvent::Progress { upload_id, progress: 100 });
                }
                handle.task.completed_at = Some(Utc::now());
                let _ = self.event_tx.send(UploadEvent::Completed { upload_id });

                // 留出展示期再移出可见集合
                let retire_tx = self.retire_tx.clone();
                let grace = self.retire_grace;
                tokio::spawn(async move {
                    tokio::time::sleep(grace).await;
                    let _ = retire_tx.send(upload_id);
                });
            }
            Ok(Err(err)) => {
                if handle.task.error.is_none() {
                    let message = match &err {
                        ScribeError::Cancelled => CANCELLED_MESSAGE.to_string(),
                        other => other.to_string(),
                    };
                    handle.task.error = Some(message.clone());
                    handle.task.completed_at = Some(Utc::now());
                    let _ = self.event_tx.send(UploadEvent::Failed { upload_id, error: message });
                }
                self.retire(upload_id);
            }
            Err(err) => {
                warn!("upload task panicked: {}", err);
                handle.task.error = Some(format!("Task panicked: {}", err));
                handle.task.completed_at = Some(Utc::now());
                let _ = self.event_tx.send(UploadEvent::Failed {
                    upload_id,
                    error: format!("Task panicked: {}", err),
                });
                self.retire(upload_id);
            }
        }
    }
}
