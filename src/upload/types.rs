use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;
use crate::errors::Result;
use super::task::UploadTask;

/// 上传任务唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct UploadId(Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 上传使用的 HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadMethod {
    Post,
    Put,
    Patch,
}

impl UploadMethod {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            UploadMethod::Post => reqwest::Method::POST,
            UploadMethod::Put => reqwest::Method::PUT,
            UploadMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// 待上传的内容
///
/// 内容常驻内存（对应浏览器里已选中的 File 对象），multipart
/// 形式按后端约定带 `file` + `name` 两个字段。
#[derive(Debug, Clone)]
pub enum UploadPayload {
    /// 请求体直接是字节流
    Raw(Bytes),
    /// multipart/form-data，`file` 为内容、`name` 为显示名
    Multipart {
        file_name: String,
        content: Bytes,
    },
}

impl UploadPayload {
    pub fn len(&self) -> u64 {
        match self {
            UploadPayload::Raw(bytes) => bytes.len() as u64,
            UploadPayload::Multipart { content, .. } => content.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// enqueue 的参数
#[derive(Debug, Clone)]
pub struct UploadSpec {
    pub url: String,
    pub method: UploadMethod,
    pub payload: UploadPayload,
    /// 渲染层展示用的文件名
    pub display_name: String,
}

/// 上传管理器命令
pub enum ManagerCommand {
    /// 入列并立即开始传输
    Enqueue {
        spec: UploadSpec,
        reply: oneshot::Sender<Result<UploadId>>,
    },

    /// 中止传输；对终态任务是 no-op
    Cancel {
        upload_id: UploadId,
        reply: oneshot::Sender<Result<()>>,
    },

    /// 从可见集合移除终态任务
    Retire {
        upload_id: UploadId,
    },

    /// 获取任务信息
    GetTask {
        upload_id: UploadId,
        reply: oneshot::Sender<Option<UploadTask>>,
    },

    /// 获取所有任务
    GetAllTasks {
        reply: oneshot::Sender<Vec<UploadTask>>,
    },
}

/// 上传事件，broadcast 给所有订阅者
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// 任务已入列
    Added {
        upload_id: UploadId,
    },

    /// 进度更新（0–100，单任务内单调不减）
    Progress {
        upload_id: UploadId,
        progress: u8,
    },

    /// 任务完成
    Completed {
        upload_id: UploadId,
    },

    /// 任务失败（含取消）
    Failed {
        upload_id: UploadId,
        error: String,
    },

    /// 任务离开可见集合
    Retired {
        upload_id: UploadId,
    },
}

// 静态断言确保类型是 Send 的
const _: () = {
    fn assert_send<T: Send>() {}
    fn assert_types() {
        assert_send::<UploadTask>();
        assert_send::<UploadEvent>();
        assert_send::<UploadSpec>();
    }
};
