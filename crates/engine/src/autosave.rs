use courseplan_core::Action;
use courseplan_storage::action_log::AppendOutcome;
use courseplan_storage::{ActionLog, LocalStore, LogBounds, StorageError};

/// Where a recorded mutation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveMode {
    /// Persist the whole collection for `identity` right away.
    Autosave { identity: String },
    /// Append the action to the local log for later replay.
    Queued,
}

/// Picks the [`SaveMode`] from the local store's autosave flag and identity,
/// and owns the queued action log.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSavePolicy {
    log: ActionLog,
}

impl AutoSavePolicy {
    pub fn new(bounds: LogBounds) -> Self {
        Self {
            log: ActionLog::new(bounds),
        }
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Autosave only when it is enabled and an identity is remembered.
    pub fn mode<S: LocalStore + ?Sized>(&self, store: &S) -> Result<SaveMode, StorageError> {
        if !store.autosave_enabled()? {
            return Ok(SaveMode::Queued);
        }
        Ok(match store.identity()? {
            Some(identity) => SaveMode::Autosave { identity },
            None => SaveMode::Queued,
        })
    }

    pub fn enqueue<S: LocalStore + ?Sized>(
        &self,
        store: &mut S,
        action: &Action,
    ) -> Result<AppendOutcome, StorageError> {
        self.log.append(store, action)
    }

    pub fn enqueue_all<S: LocalStore + ?Sized>(
        &self,
        store: &mut S,
        actions: &[Action],
    ) -> Result<AppendOutcome, StorageError> {
        self.log.append_all(store, actions)
    }
}

/// Mutation count at the moment a save started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SaveTicket(u64);

/// Tracks the unsaved-changes flag against a monotonic mutation counter, so
/// a save that finishes after newer mutations does not clear the flag.
#[derive(Debug, Default)]
pub struct SaveSequencer {
    mutations: u64,
    unsaved: bool,
}

impl SaveSequencer {
    pub fn record_mutation(&mut self) {
        self.mutations += 1;
        self.unsaved = true;
    }

    pub fn begin_save(&self) -> SaveTicket {
        SaveTicket(self.mutations)
    }

    /// Returns whether the flag was cleared.
    pub fn finish_save(&mut self, ticket: SaveTicket, succeeded: bool) -> bool {
        if succeeded && ticket.0 == self.mutations {
            self.unsaved = false;
            return true;
        }
        false
    }

    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }

    pub fn unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }
}
