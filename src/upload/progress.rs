use std::pin::Pin;
use std::task::{Context, Poll};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use tokio::sync::mpsc;

/// 默认分块大小，决定进度回报的粒度
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// 把内存中的请求体切成块的流，供 `reqwest::Body::wrap_stream` 消费
pub fn chunk_bytes(content: Bytes, chunk_size: usize) -> impl Stream<Item = std::io::Result<Bytes>> {
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<std::io::Result<Bytes>> = (0..content.len())
        .step_by(chunk_size)
        .map(|start| {
            let end = (start + chunk_size).min(content.len());
            Ok(content.slice(start..end))
        })
        .collect();

    futures::stream::iter(chunks)
}

pin_project! {
    /// 包装请求体流，按已发送字节数回报百分比进度
    ///
    /// 百分比 = floor(sent / total * 100)，只在数值变化时发送，
    /// 因此单任务内收到的序列必然单调递增。
    pub struct ProgressStream<S> {
        #[pin]
        inner: S,
        total: u64,
        sent: u64,
        last_reported: Option<u8>,
        progress_tx: mpsc::UnboundedSender<u8>,
    }
}

impl<S> ProgressStream<S> {
    pub fn new(inner: S, total: u64, progress_tx: mpsc::UnboundedSender<u8>) -> Self {
        Self {
            inner,
            total,
            sent: 0,
            last_reported: None,
            progress_tx,
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                *this.sent += chunk.len() as u64;

                if *this.total > 0 {
                    let percentage = (*this.sent * 100 / *this.total).min(100) as u8;
                    if Some(percentage) != *this.last_reported {
                        *this.last_reported = Some(percentage);
                        // 接收端关闭说明任务已终止，丢弃即可
                        let _ = this.progress_tx.send(percentage);
                    }
                }

                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use super::*;

    #[tokio::test]
    async fn test_progress_sequence_is_monotonic() {
        let content = Bytes::from(vec![0u8; 1000]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let stream = ProgressStream::new(chunk_bytes(content, 100), 1000, tx);
        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 10);

        let mut reported = Vec::new();
        while let Ok(p) = rx.try_recv() {
            reported.push(p);
        }

        assert_eq!(reported, vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
    }

    #[tokio::test]
    async fn test_uneven_chunks_end_at_100() {
        let content = Bytes::from(vec![0u8; 250]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let stream = ProgressStream::new(chunk_bytes(content, 99), 250, tx);
        let _: Vec<_> = stream.collect().await;

        let mut reported = Vec::new();
        while let Ok(p) = rx.try_recv() {
            reported.push(p);
        }

        assert!(reported.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*reported.last().unwrap(), 100);
    }

    #[test]
    fn test_chunk_bytes_empty_payload() {
        let stream = chunk_bytes(Bytes::new(), DEFAULT_CHUNK_SIZE);
        assert_eq!(futures::executor::block_on(futures::StreamExt::count(stream)), 0);
    }
}
