pub mod api;
pub mod config;
pub mod errors;
pub mod notify;
pub mod sse;
pub mod store;
pub mod upload;
pub mod utils;

// 重新导出核心类型
pub use api::ApiClient;
pub use config::Config;
pub use errors::{Result, ScribeError};
pub use notify::{
    Alert,
    NotificationCategory,
    NotificationEvent,
    NotificationRouter,
    NotificationType,
    TaskKind,
};
pub use sse::{ConnectionStatus, EventStreamClient};
pub use store::{
    FileRecord,
    FileStore,
    ListQuery,
    MediaType,
    Priority,
    RecordStatus,
    Sort,
    TranscriptionRecord,
    TranscriptionStore,
};
pub use upload::{
    HttpTransport,
    UploadEvent,
    UploadId,
    UploadManager,
    UploadManagerHandle,
    UploadMethod,
    UploadPayload,
    UploadSpec,
    UploadStatus,
    UploadTask,
    UploadTransport,
};
