use async_trait::async_trait;
use reqwest::{Body, Client, multipart};
use tokio::sync::mpsc;
use crate::api::detail_from_body;
use crate::errors::{Result, ScribeError};
use super::progress::{chunk_bytes, DEFAULT_CHUNK_SIZE, ProgressStream};
use super::types::{UploadPayload, UploadSpec};

/// 实际执行传输的 seam，测试用 mock 实现驱动确定的进度序列
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// 执行一次传输，百分比进度经 `progress_tx` 回报
    async fn send(&self, spec: &UploadSpec, progress_tx: mpsc::UnboundedSender<u8>) -> Result<()>;
}

/// 基于 reqwest 的传输实现
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn send(&self, spec: &UploadSpec, progress_tx: mpsc::UnboundedSender<u8>) -> Result<()> {
        let total = spec.payload.len();
        let request = self.client.request(spec.method.as_reqwest(), &spec.url);

        let request = match &spec.payload {
            UploadPayload::Raw(content) => {
                let stream = ProgressStream::new(
                    chunk_bytes(content.clone(), DEFAULT_CHUNK_SIZE),
                    total,
                    progress_tx,
                );
                request.body(Body::wrap_stream(stream))
            }
            UploadPayload::Multipart { file_name, content } => {
                let stream = ProgressStream::new(
                    chunk_bytes(content.clone(), DEFAULT_CHUNK_SIZE),
                    total,
                    progress_tx,
                );
                let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), total)
                    .file_name(file_name.clone());
                let form = multipart::Form::new()
                    .part("file", part)
                    .text("name", file_name.clone());
                request.multipart(form)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ScribeError::server_error(
                status.as_u16(),
                detail_from_body(status, &body),
            ));
        }

        Ok(())
    }
}
