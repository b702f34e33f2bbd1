use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use crate::api::ApiClient;
use crate::notify::NotificationEvent;
use crate::utils::{reconnect_backoff, RetryStrategy};
use super::parser::SseParser;

/// 推送通道的连接状态，渲染层照此显示 loading / 服务不可用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected { reason: String },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

enum StreamEnd {
    Cancelled,
    /// 服务端断流（EOF）或传输错误
    Lost(String),
}

/// 监护一条长连 SSE 通道的客户端
///
/// 断线后按指数退避重连，预算用完停在 Disconnected；
/// drop 时保证连接关闭。
pub struct EventStreamClient {
    cancellation_token: CancellationToken,
    status_rx: watch::Receiver<ConnectionStatus>,
    supervisor_handle: JoinHandle<()>,
}

impl EventStreamClient {
    /// 打开通道，返回客户端与事件接收端
    ///
    /// 事件按传输到达顺序逐条送出，不做缓冲或重排。
    pub fn connect(
        api: ApiClient,
        max_reconnect_attempts: u32,
    ) -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        Self::connect_with_backoff(api, max_reconnect_attempts, reconnect_backoff())
    }

    /// 自定义重连退避的 `connect` 变体
    pub fn connect_with_backoff(
        api: ApiClient,
        max_reconnect_attempts: u32,
        backoff: RetryStrategy,
    ) -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let cancellation_token = CancellationToken::new();

        let supervisor_handle = tokio::spawn(Self::supervise(
            api,
            max_reconnect_attempts,
            backoff,
            cancellation_token.clone(),
            status_tx,
            event_tx,
        ));

        let client = Self {
            cancellation_token,
            status_rx,
            supervisor_handle,
        };

        (client, event_rx)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status_rx.borrow().clone()
    }

    /// 状态变更的订阅端，渲染层 watch 着用
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// 主动关闭通道并等监护任务退出
    pub async fn disconnect(mut self) {
        self.cancellation_token.cancel();
        let _ = (&mut self.supervisor_handle).await;
    }

    async fn supervise(
        api: ApiClient,
        max_reconnect_attempts: u32,
        backoff: RetryStrategy,
        token: CancellationToken,
        status_tx: watch::Sender<ConnectionStatus>,
        event_tx: mpsc::UnboundedSender<NotificationEvent>,
    ) {
        let mut attempt: u32 = 0;

        loop {
            let _ = status_tx.send(ConnectionStatus::Connecting);

            match api.open_notification_stream().await {
                Ok(response) => {
                    info!("notification stream connected");
                    let _ = status_tx.send(ConnectionStatus::Connected);
                    // 连上即清零重连预算
                    attempt = 0;

                    match Self::consume(response, &token, &event_tx).await {
                        StreamEnd::Cancelled => {
                            let _ = status_tx.send(ConnectionStatus::Disconnected {
                                reason: "Connection closed".to_string(),
                            });
                            return;
                        }
                        StreamEnd::Lost(reason) => {
                            warn!("notification stream lost: {}", reason);
                            let _ = status_tx.send(ConnectionStatus::Disconnected { reason });
                        }
                    }
                }
                Err(err) => {
                    warn!("notification stream connect failed: {}", err);
                    let _ = status_tx.send(ConnectionStatus::Disconnected {
                        reason: err.to_string(),
                    });
                }
            }

            if attempt >= max_reconnect_attempts {
                warn!("reconnect budget exhausted after {} attempts", attempt);
                return;
            }

            let delay = backoff.get_delay(attempt);
            attempt += 1;

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return,
            }
        }
    }

    /// 读流直到取消、EOF 或错误；坏帧丢弃，不拆连接
    async fn consume(
        response: reqwest::Response,
        token: &CancellationToken,
        event_tx: &mpsc::UnboundedSender<NotificationEvent>,
    ) -> StreamEnd {
        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();

        loop {
            tokio::select! {
                _ = token.cancelled() => return StreamEnd::Cancelled,
                chunk = stream.next() => {
                    match chunk {
                        Some(Ok(bytes)) => {
                            for payload in parser.feed(&bytes) {
                                match serde_json::from_str::<NotificationEvent>(&payload) {
                                    Ok(event) => {
                                        if event_tx.send(event).is_err() {
                                            // 没有订阅者了
                                            return StreamEnd::Cancelled;
                                        }
                                    }
                                    Err(err) => {
                                        debug!("dropping malformed notification: {}", err);
                                    }
                                }
                            }
                        }
                        Some(Err(err)) => return StreamEnd::Lost(err.to_string()),
                        None => return StreamEnd::Lost("Stream ended".to_string()),
                    }
                }
            }
        }
    }
}

impl Drop for EventStreamClient {
    fn drop(&mut self) {
        // 视图卸载等任何退出路径上都保证连接被收走
        self.cancellation_token.cancel();
    }
}
