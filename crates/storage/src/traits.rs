use crate::error::StorageError;

/// Keys of the local persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalKey {
    /// `"true"` / `"false"`; selects autosave over the queued action log.
    AutoSaveEnabled,
    /// Identity whose remote save autosave writes to.
    Identity,
    /// JSON array of queued actions.
    ActionLog,
}

impl LocalKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoSaveEnabled => "autosave-enabled",
            Self::Identity => "identity",
            Self::ActionLog => "action-log",
        }
    }
}

/// String key/value state that outlives the process.
pub trait LocalStore {
    fn get(&self, key: LocalKey) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: LocalKey, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: LocalKey) -> Result<(), StorageError>;

    fn autosave_enabled(&self) -> Result<bool, StorageError> {
        Ok(self.get(LocalKey::AutoSaveEnabled)?.as_deref() == Some("true"))
    }

    fn set_autosave_enabled(&mut self, enabled: bool) -> Result<(), StorageError> {
        self.set(LocalKey::AutoSaveEnabled, if enabled { "true" } else { "false" })
    }

    fn identity(&self) -> Result<Option<String>, StorageError> {
        Ok(self.get(LocalKey::Identity)?.filter(|id| !id.is_empty()))
    }
}
