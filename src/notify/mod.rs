mod router;
mod types;

pub use router::NotificationRouter;
pub use types::{
    Alert,
    NotificationCategory,
    NotificationEvent,
    NotificationType,
    TaskKind,
};
