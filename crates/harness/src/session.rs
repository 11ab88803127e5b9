use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use courseplan_engine::{ChangeEvent, Engine, EngineConfig, EngineError};
use tempfile::TempDir;

use crate::MemoryBackend;

/// Change events seen by a subscriber, in order.
pub type EventLog = Rc<RefCell<Vec<ChangeEvent>>>;

/// An engine on a file-backed local store in a temp directory, wired to a
/// shared [`MemoryBackend`]. `reload` stands in for closing and reopening
/// the app: the store file and the backend's saves survive, memory does not.
pub struct TestSession {
    pub engine: Engine,
    pub backend: MemoryBackend,
    config: EngineConfig,
    db_path: PathBuf,
    _dir: TempDir,
}

impl TestSession {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("local.db");
        let backend = MemoryBackend::new();
        let engine = Engine::open(config.clone(), &db_path, backend.clone())?;
        Ok(Self {
            engine,
            backend,
            config,
            db_path,
            _dir: dir,
        })
    }

    /// Drop the engine and open a fresh one on the same store and backend.
    pub fn reload(&mut self) -> Result<(), EngineError> {
        self.engine = Engine::open(self.config.clone(), &self.db_path, self.backend.clone())?;
        Ok(())
    }

    pub fn enable_autosave(&mut self, identity: &str) -> Result<(), EngineError> {
        self.engine.set_identity(Some(identity))?;
        self.engine.set_autosave(true)
    }

    /// Subscribe to every change event and collect what fires.
    pub fn record_events(&mut self) -> EventLog {
        let log: EventLog = Rc::new(RefCell::new(Vec::new()));
        for event in ChangeEvent::ALL {
            let log = log.clone();
            self.engine
                .subscribe(event, move || log.borrow_mut().push(event));
        }
        log
    }
}
