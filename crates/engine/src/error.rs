use courseplan_core::{CoreError, CustomEventId};
use courseplan_storage::StorageError;
use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("persistence backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("schedule index {index} out of range ({count} schedules)")]
    ScheduleIndexOutOfRange { index: usize, count: usize },

    #[error("custom event not found: {0}")]
    CustomEventNotFound(CustomEventId),

    #[error("schedule is read-only while previewing a skeleton schedule")]
    ReadOnly,

    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
