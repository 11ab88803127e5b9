use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use courseplan_core::ScheduleSaveState;
use courseplan_engine::{BackendError, ScheduleBackend};

#[derive(Default)]
struct Inner {
    saves: BTreeMap<String, ScheduleSaveState>,
    fail_persist: bool,
    fail_load: bool,
    persist_calls: usize,
}

/// In-memory [`ScheduleBackend`]. Clones share the same saves, so a test can
/// keep a handle after giving one to an engine.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `persist` fail until switched off.
    pub fn fail_persist(&self, fail: bool) {
        self.inner.borrow_mut().fail_persist = fail;
    }

    pub fn fail_load(&self, fail: bool) {
        self.inner.borrow_mut().fail_load = fail;
    }

    pub fn saved(&self, identity: &str) -> Option<ScheduleSaveState> {
        self.inner.borrow().saves.get(identity).cloned()
    }

    pub fn seed(&self, identity: &str, state: ScheduleSaveState) {
        self.inner
            .borrow_mut()
            .saves
            .insert(identity.to_string(), state);
    }

    pub fn persist_calls(&self) -> usize {
        self.inner.borrow().persist_calls
    }
}

impl ScheduleBackend for MemoryBackend {
    fn persist(&mut self, identity: &str, state: &ScheduleSaveState) -> Result<(), BackendError> {
        let mut inner = self.inner.borrow_mut();
        inner.persist_calls += 1;
        if inner.fail_persist {
            return Err(BackendError::Unavailable("injected persist failure".into()));
        }
        inner.saves.insert(identity.to_string(), state.clone());
        Ok(())
    }

    fn load(&mut self, identity: &str) -> Result<Option<ScheduleSaveState>, BackendError> {
        let inner = self.inner.borrow();
        if inner.fail_load {
            return Err(BackendError::Unavailable("injected load failure".into()));
        }
        Ok(inner.saves.get(identity).cloned())
    }
}
