use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;
use crate::config::Config;
use crate::errors::{Result, ScribeError};
use crate::store::{FileRecord, ListEnvelope, ListQuery, Priority, TranscriptionRecord};

/// 非 2xx 响应的错误体：`{ "detail": "..." }`
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
}

/// 单条记录的响应信封：`{ "data": {...} }`
#[derive(Debug, Deserialize)]
struct RecordEnvelope<T> {
    data: T,
}

/// 后端 REST 接口的客户端
///
/// 共享一个 `reqwest::Client`，所有请求走同一个连接池。
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        // 提前校验 base_url，后续只做字符串拼接
        Url::parse(&config.base_url)?;

        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 上传接口地址，上传管理器用它构造任务
    pub fn upload_url(&self) -> String {
        format!("{}/files", self.base_url)
    }

    /// SSE 推送通道地址
    pub fn notifications_url(&self) -> String {
        format!("{}/sse/notifications", self.base_url)
    }

    pub async fn list_files(&self, query: ListQuery) -> Result<Vec<FileRecord>> {
        let url = format!(
            "{}/files?limit={}&offset={}&sort={}",
            self.base_url,
            query.limit,
            query.offset,
            query.sort.as_str()
        );

        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;
        let envelope: ListEnvelope<FileRecord> = response.json().await?;

        Ok(envelope.data)
    }

    pub async fn list_transcriptions(&self, query: ListQuery) -> Result<Vec<TranscriptionRecord>> {
        let url = format!(
            "{}/transcriptions?limit={}&offset={}&sort={}",
            self.base_url,
            query.limit,
            query.offset,
            query.sort.as_str()
        );

        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;
        let envelope: ListEnvelope<TranscriptionRecord> = response.json().await?;

        Ok(envelope.data)
    }

    /// 对已上传的文件发起一次转写任务
    pub async fn transcribe_file(
        &self,
        file_id: &str,
        language: &str,
        priority: Priority,
    ) -> Result<TranscriptionRecord> {
        let url = format!("{}/transcriptions", self.base_url);
        let body = serde_json::json!({
            "file_id": file_id,
            "language": language,
            "priority": priority,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let response = Self::check_status(response).await?;
        let envelope: RecordEnvelope<TranscriptionRecord> = response.json().await?;

        Ok(envelope.data)
    }

    pub async fn delete_file(&self, id: &str) -> Result<()> {
        let url = format!("{}/files/{}", self.base_url, id);
        let response = self.client.delete(&url).send().await?;
        Self::check_status(response).await?;

        Ok(())
    }

    pub async fn terminate_transcription(&self, id: &str) -> Result<()> {
        let url = format!("{}/transcriptions/{}/terminate", self.base_url, id);
        let response = self.client.delete(&url).send().await?;
        Self::check_status(response).await?;

        Ok(())
    }

    /// 下载转写结果，调用方负责按记录名落盘
    pub async fn download_transcription(&self, id: &str) -> Result<Bytes> {
        let url = format!("{}/transcriptions/{}/download", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        let response = Self::check_status(response).await?;

        Ok(response.bytes().await?)
    }

    /// 打开 SSE 通道，返回原始响应由调用方消费字节流
    pub(crate) async fn open_notification_stream(&self) -> Result<Response> {
        let response = self
            .client
            .get(self.notifications_url())
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// 检查状态码，非 2xx 时取出 `detail` 作为错误消息
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorDetail>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| generic_message(status));

        Err(ScribeError::server_error(status.as_u16(), detail))
    }
}

fn generic_message(status: StatusCode) -> String {
    format!("Something went wrong ({})", status)
}

/// Extract the server's `detail` text from a raw error body, falling back
/// to a generic message. Shared with the upload transport, which reads the
/// body itself.
pub(crate) fn detail_from_body(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorDetail>(body)
        .ok()
        .and_then(|parsed| parsed.detail)
        .unwrap_or_else(|| generic_message(status))
}
