mod records;
mod store;

pub use records::{
    FileRecord,
    ListEnvelope,
    ListQuery,
    MediaType,
    Priority,
    RecordStatus,
    Sort,
    TranscriptionRecord,
};
pub use store::{EntityRecord, EntityStore, FileStore, TranscriptionStore};
