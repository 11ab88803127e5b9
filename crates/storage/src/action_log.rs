use courseplan_core::Action;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::traits::{LocalKey, LocalStore};

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_TRIM_BATCH: usize = 100;

/// Size limits of the queued action log. Once an append would push the log
/// past `capacity`, the `trim_batch` oldest records are dropped first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogBounds {
    pub capacity: usize,
    pub trim_batch: usize,
}

impl Default for LogBounds {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            trim_batch: DEFAULT_TRIM_BATCH,
        }
    }
}

/// Result of reading the stored log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRead {
    /// Nothing is queued.
    Absent,
    /// The log parsed; records that did not decode as an [`Action`] were skipped.
    Parsed { actions: Vec<Action>, skipped: usize },
    /// The stored text is not a JSON array. Treated as an empty log.
    Corrupt,
}

impl LogRead {
    pub fn actions(&self) -> &[Action] {
        match self {
            Self::Parsed { actions, .. } => actions,
            Self::Absent | Self::Corrupt => &[],
        }
    }

    pub fn into_actions(self) -> Vec<Action> {
        match self {
            Self::Parsed { actions, .. } => actions,
            Self::Absent | Self::Corrupt => Vec::new(),
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

/// What an append did to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub len: usize,
    pub trimmed: usize,
}

fn parse_records(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Vec<Value>>(text) {
        Ok(records) => Some(records),
        Err(e) => {
            warn!(error = %e, "stored action log is not a JSON array; treating as empty");
            None
        }
    }
}

/// Decode stored log text. Never fails: corrupt text yields [`LogRead::Corrupt`].
pub fn parse_log(text: &str) -> LogRead {
    let Some(records) = parse_records(text) else {
        return LogRead::Corrupt;
    };
    let mut actions = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for record in records {
        let tag = record
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_string();
        match Action::from_record(record) {
            Ok(action) => actions.push(action),
            Err(e) => {
                skipped += 1;
                if Action::is_known_tag(&tag) {
                    warn!(tag = %tag, error = %e, "skipping malformed queued action");
                } else {
                    warn!(tag = %tag, "skipping queued action with unrecognized tag");
                }
            }
        }
    }
    LogRead::Parsed { actions, skipped }
}

/// The ordered queue of actions recorded while autosave is off, kept in a
/// [`LocalStore`] under [`LocalKey::ActionLog`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionLog {
    bounds: LogBounds,
}

impl ActionLog {
    pub fn new(bounds: LogBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> LogBounds {
        self.bounds
    }

    pub fn read<S: LocalStore + ?Sized>(&self, store: &S) -> Result<LogRead, StorageError> {
        Ok(match store.get(LocalKey::ActionLog)? {
            None => LogRead::Absent,
            Some(text) => parse_log(&text),
        })
    }

    /// Number of records currently stored, decodable or not.
    pub fn len<S: LocalStore + ?Sized>(&self, store: &S) -> Result<usize, StorageError> {
        Ok(store
            .get(LocalKey::ActionLog)?
            .and_then(|text| parse_records(&text))
            .map_or(0, |records| records.len()))
    }

    /// Append `action`, trimming the oldest batch first if the log is full.
    pub fn append<S: LocalStore + ?Sized>(
        &self,
        store: &mut S,
        action: &Action,
    ) -> Result<AppendOutcome, StorageError> {
        let outcome = self.append_all(store, std::slice::from_ref(action))?;
        debug!(tag = action.tag(), len = outcome.len, "queued action");
        Ok(outcome)
    }

    /// Append `actions` in order with one read and one write. The stored
    /// result matches appending them one at a time.
    pub fn append_all<S: LocalStore + ?Sized>(
        &self,
        store: &mut S,
        actions: &[Action],
    ) -> Result<AppendOutcome, StorageError> {
        let mut records = store
            .get(LocalKey::ActionLog)?
            .and_then(|text| parse_records(&text))
            .unwrap_or_default();

        let mut trimmed = 0;
        for action in actions {
            while !records.is_empty() && records.len() >= self.bounds.capacity {
                let batch = self.bounds.trim_batch.max(1).min(records.len());
                records.drain(..batch);
                trimmed += batch;
            }
            let record = serde_json::to_value(action)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            records.push(record);
        }
        if trimmed > 0 {
            debug!(trimmed, remaining = records.len(), "trimmed oldest queued actions");
        }

        let text =
            serde_json::to_string(&records).map_err(|e| StorageError::Serialization(e.to_string()))?;
        store.set(LocalKey::ActionLog, &text)?;
        Ok(AppendOutcome {
            len: records.len(),
            trimmed,
        })
    }

    /// Read the log and remove it from the store in one step.
    pub fn take<S: LocalStore + ?Sized>(&self, store: &mut S) -> Result<LogRead, StorageError> {
        let read = self.read(store)?;
        if read.is_present() {
            store.remove(LocalKey::ActionLog)?;
        }
        Ok(read)
    }

    pub fn clear<S: LocalStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        store.remove(LocalKey::ActionLog)
    }
}
