use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use crate::errors::{Result, ScribeError};
use super::transport::UploadTransport;
use super::types::UploadSpec;

/// 执行单个上传的 worker，传输与取消令牌之间做 select
pub struct UploadWorker {
    pub(crate) transport: Arc<dyn UploadTransport>,
    pub(crate) cancellation_token: CancellationToken,
}

impl UploadWorker {
    pub async fn run(self, spec: UploadSpec, progress_tx: mpsc::UnboundedSender<u8>) -> Result<()> {
        let future = self.transport.send(&spec, progress_tx);

        tokio::select! {
            result = future => result,
            _ = self.cancellation_token.cancelled() => {
                Err(ScribeError::Cancelled)
            }
        }
    }
}
