use courseplan_core::Action;
use courseplan_storage::LogRead;
use tracing::{debug, info, warn};

use crate::Engine;
use crate::autosave::SaveMode;
use crate::error::EngineError;

/// Asks the user whether queued actions should be applied.
pub trait ReplayPrompt {
    fn confirm_replay(&mut self, pending: usize) -> bool;
}

impl<F: FnMut(usize) -> bool> ReplayPrompt for F {
    fn confirm_replay(&mut self, pending: usize) -> bool {
        self(pending)
    }
}

pub struct AlwaysReplay;

impl ReplayPrompt for AlwaysReplay {
    fn confirm_replay(&mut self, _pending: usize) -> bool {
        true
    }
}

pub struct NeverReplay;

impl ReplayPrompt for NeverReplay {
    fn confirm_replay(&mut self, _pending: usize) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Decodable actions found in the log.
    pub pending: usize,
    pub applied: usize,
    /// Records that did not decode plus actions that failed or were refused.
    pub skipped: usize,
    pub declined: bool,
    /// The stored log was not a JSON array.
    pub corrupt: bool,
}

impl Engine {
    /// Apply the queued action log, if any, after asking `prompt`.
    ///
    /// The log is removed from the store either way. Actions are applied in
    /// order through [`Engine::apply_action`]; one that fails is skipped and
    /// the rest still run. Applied actions are then persisted together in
    /// autosave mode, or queued again otherwise, so they stay pending until
    /// the collection is saved.
    pub fn replay_pending(
        &mut self,
        prompt: &mut dyn ReplayPrompt,
    ) -> Result<ReplayReport, EngineError> {
        let log = *self.autosave.log();
        let mut report = ReplayReport::default();
        let actions = match log.take(&mut self.store)? {
            LogRead::Absent => return Ok(report),
            LogRead::Corrupt => {
                report.corrupt = true;
                Vec::new()
            }
            LogRead::Parsed { actions, skipped } => {
                report.skipped = skipped;
                actions
            }
        };
        report.pending = actions.len();
        if actions.is_empty() {
            info!(skipped = report.skipped, corrupt = report.corrupt, "discarded empty action log");
            return Ok(report);
        }
        if !prompt.confirm_replay(report.pending) {
            report.declined = true;
            info!(pending = report.pending, "replay declined; queued actions discarded");
            return Ok(report);
        }

        let mut applied: Vec<Action> = Vec::with_capacity(actions.len());
        self.replaying = true;
        for action in actions {
            match self.run(action.clone()) {
                Ok(outcome) if outcome.refused => {
                    report.skipped += 1;
                    debug!(tag = action.tag(), "queued action refused; dropped");
                }
                Ok(_) => applied.push(action),
                Err(e) => {
                    report.skipped += 1;
                    warn!(tag = action.tag(), error = %e, "skipping queued action that failed to apply");
                }
            }
        }
        self.replaying = false;
        report.applied = applied.len();

        self.settle_replayed(&applied);
        info!(
            pending = report.pending,
            applied = report.applied,
            skipped = report.skipped,
            "replayed queued actions"
        );
        Ok(report)
    }

    fn settle_replayed(&mut self, applied: &[Action]) {
        if applied.is_empty() {
            return;
        }
        let persisted = match self.autosave.mode(&self.store) {
            Ok(SaveMode::Autosave { identity }) => self.autosave_now(&identity),
            Ok(SaveMode::Queued) => false,
            Err(e) => {
                warn!(error = %e, "could not read autosave settings after replay");
                false
            }
        };
        if persisted {
            return;
        }
        if let Err(e) = self.autosave.enqueue_all(&mut self.store, applied) {
            warn!(count = applied.len(), error = %e, "failed to re-queue replayed actions");
        }
    }
}
