use std::path::PathBuf;

use courseplan_core::ScheduleSaveState;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend rejected save for {identity}: {reason}")]
    Rejected { identity: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote home of saved schedules, addressed by user identity. The engine
/// only ever hands it whole save states.
pub trait ScheduleBackend {
    fn persist(&mut self, identity: &str, state: &ScheduleSaveState) -> Result<(), BackendError>;

    /// `Ok(None)` when nothing is saved under `identity`.
    fn load(&mut self, identity: &str) -> Result<Option<ScheduleSaveState>, BackendError>;
}

impl<B: ScheduleBackend + ?Sized> ScheduleBackend for Box<B> {
    fn persist(&mut self, identity: &str, state: &ScheduleSaveState) -> Result<(), BackendError> {
        (**self).persist(identity, state)
    }

    fn load(&mut self, identity: &str) -> Result<Option<ScheduleSaveState>, BackendError> {
        (**self).load(identity)
    }
}

/// Saves to `primary` and, best effort, to `secondary`. Loads come from the
/// primary only.
pub struct MirroredBackend<P, S> {
    primary: P,
    secondary: S,
}

impl<P: ScheduleBackend, S: ScheduleBackend> MirroredBackend<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

impl<P: ScheduleBackend, S: ScheduleBackend> ScheduleBackend for MirroredBackend<P, S> {
    fn persist(&mut self, identity: &str, state: &ScheduleSaveState) -> Result<(), BackendError> {
        let primary = self.primary.persist(identity, state);
        if let Err(e) = self.secondary.persist(identity, state) {
            warn!(identity, error = %e, "secondary schedule save failed");
        }
        primary
    }

    fn load(&mut self, identity: &str) -> Result<Option<ScheduleSaveState>, BackendError> {
        self.primary.load(identity)
    }
}

/// One JSON file per identity in a directory.
pub struct JsonDirBackend {
    dir: PathBuf,
}

impl JsonDirBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, identity: &str) -> Result<PathBuf, BackendError> {
        let valid = !identity.is_empty()
            && identity
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !identity.starts_with('.');
        if !valid {
            return Err(BackendError::Rejected {
                identity: identity.to_string(),
                reason: "identity is not a valid file name".into(),
            });
        }
        Ok(self.dir.join(format!("{identity}.json")))
    }
}

impl ScheduleBackend for JsonDirBackend {
    fn persist(&mut self, identity: &str, state: &ScheduleSaveState) -> Result<(), BackendError> {
        let path = self.path_for(identity)?;
        let text = state
            .to_json()
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn load(&mut self, identity: &str) -> Result<Option<ScheduleSaveState>, BackendError> {
        let path = self.path_for(identity)?;
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        ScheduleSaveState::from_json(&text)
            .map(Some)
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }
}
