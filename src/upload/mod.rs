mod manager;
mod manager_worker;
mod progress;
mod task;
mod transport;
mod types;
mod worker;

pub use manager::{UploadManager, UploadManagerHandle};
pub use manager_worker::FilesRefresh;
pub use progress::{chunk_bytes, DEFAULT_CHUNK_SIZE, ProgressStream};
pub use task::{CANCELLED_MESSAGE, UploadStatus, UploadTask};
pub use transport::{HttpTransport, UploadTransport};
pub use types::{
    UploadEvent,
    UploadId,
    UploadMethod,
    UploadPayload,
    UploadSpec,
};
