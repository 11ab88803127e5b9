pub mod autosave;
pub mod backend;
pub mod calendar;
pub mod collection;
pub mod config;
pub mod conflicts;
pub mod error;
pub mod events;
pub mod replay;
pub mod undo;

pub use autosave::{AutoSavePolicy, SaveMode, SaveSequencer, SaveTicket};
pub use backend::{BackendError, JsonDirBackend, MirroredBackend, ScheduleBackend};
pub use calendar::CalendarEvent;
pub use collection::ScheduleCollection;
pub use config::EngineConfig;
pub use conflicts::{Conflict, Occupant};
pub use error::EngineError;
pub use events::{ChangeEvent, ColorChannels, ColorKey, EventBus, PickerId, SubscriptionId};
pub use replay::{AlwaysReplay, NeverReplay, ReplayPrompt, ReplayReport};

use std::path::Path;

use courseplan_core::names::mangle_duplicate_schedule_names;
use courseplan_core::{Action, CustomEvent, CustomEventId, ScheduleCourse, ScheduleSaveState};
use courseplan_storage::{LocalKey, LocalStore, SqliteLocalStore};
use tracing::{debug, info, warn};

use crate::events::ChangeEvent::*;

const ADDED_COURSES: &[ChangeEvent] = &[AddedCoursesChange];
const CUSTOM_EVENTS: &[ChangeEvent] = &[CustomEventsChange];
const COLOR: &[ChangeEvent] = &[ColorChange];
const CLEARED: &[ChangeEvent] = &[AddedCoursesChange, CustomEventsChange];
const SCHEDULE_ADDED: &[ChangeEvent] = &[
    ScheduleNamesChange,
    CurrentScheduleIndexChange,
    ScheduleNotesChange,
];
const SCHEDULE_NAMES: &[ChangeEvent] = &[ScheduleNamesChange];
const SCHEDULES_RESHAPED: &[ChangeEvent] = &[
    ScheduleNamesChange,
    CurrentScheduleIndexChange,
    AddedCoursesChange,
    CustomEventsChange,
    ScheduleNotesChange,
];
const SCHEDULE_NOTES: &[ChangeEvent] = &[ScheduleNotesChange];
const UNDONE: &[ChangeEvent] = &[
    AddedCoursesChange,
    CustomEventsChange,
    ColorChange,
    ScheduleNamesChange,
    CurrentScheduleIndexChange,
    ScheduleNotesChange,
];
const SCHEDULE_SWITCHED: &[ChangeEvent] = &[CurrentScheduleIndexChange, ScheduleNotesChange];
const LOADED: &[ChangeEvent] = &[
    AddedCoursesChange,
    CustomEventsChange,
    ScheduleNamesChange,
    CurrentScheduleIndexChange,
    ScheduleNotesChange,
];

/// What a dispatched action did, and who has to hear about it.
struct Applied {
    changed: bool,
    /// The call was turned away without touching state; nothing is recorded.
    refused: bool,
    notify: &'static [ChangeEvent],
    color: Option<(ColorKey, String)>,
    course: Option<ScheduleCourse>,
}

impl Applied {
    fn new(changed: bool, notify: &'static [ChangeEvent]) -> Self {
        Self {
            changed,
            refused: false,
            notify,
            color: None,
            course: None,
        }
    }

    fn refused() -> Self {
        Self {
            refused: true,
            ..Self::new(false, &[])
        }
    }

    fn with_color(mut self, key: ColorKey, color: &str) -> Self {
        self.color = Some((key, color.to_string()));
        self
    }
}

/// The mutation coordinator: owns the schedule collection and wraps every
/// mutation with the unsaved flag, the autosave/queue decision and change
/// notifications, in that order.
pub struct Engine {
    config: EngineConfig,
    collection: ScheduleCollection,
    store: SqliteLocalStore,
    backend: Box<dyn ScheduleBackend>,
    autosave: AutoSavePolicy,
    saves: SaveSequencer,
    events: EventBus,
    colors: ColorChannels,
    replaying: bool,
    skeleton: bool,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        store: SqliteLocalStore,
        backend: impl ScheduleBackend + 'static,
    ) -> Self {
        Self {
            collection: ScheduleCollection::new(&config),
            autosave: AutoSavePolicy::new(config.action_log.bounds()),
            config,
            store,
            backend: Box::new(backend),
            saves: SaveSequencer::default(),
            events: EventBus::new(),
            colors: ColorChannels::new(),
            replaying: false,
            skeleton: false,
        }
    }

    /// Open the local store at `db_path` and build an engine on it.
    pub fn open(
        config: EngineConfig,
        db_path: impl AsRef<Path>,
        backend: impl ScheduleBackend + 'static,
    ) -> Result<Self, EngineError> {
        let store = SqliteLocalStore::open(db_path)?;
        Ok(Self::new(config, store, backend))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn collection(&self) -> &ScheduleCollection {
        &self.collection
    }

    pub fn store(&self) -> &SqliteLocalStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SqliteLocalStore {
        &mut self.store
    }

    /// Back to a single empty schedule with no history. Subscribers, color
    /// pickers and local store contents are kept.
    pub fn reset(&mut self) {
        self.collection = ScheduleCollection::new(&self.config);
        self.saves = SaveSequencer::default();
        self.skeleton = false;
        self.replaying = false;
    }

    pub fn unsaved_changes(&self) -> bool {
        self.saves.unsaved_changes()
    }

    pub fn is_skeleton(&self) -> bool {
        self.skeleton
    }

    fn ensure_writable(&self) -> Result<(), EngineError> {
        if self.skeleton {
            return Err(EngineError::ReadOnly);
        }
        Ok(())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn dispatch(&mut self, action: &Action) -> Result<Applied, EngineError> {
        let c = &mut self.collection;
        Ok(match action {
            Action::AddCourse {
                course,
                schedule_index,
            } => {
                let (changed, course) = c.add_course(course.clone(), *schedule_index)?;
                Applied {
                    course: Some(course),
                    ..Applied::new(changed, ADDED_COURSES)
                }
            }
            Action::DeleteCourse { section_code, term } => {
                Applied::new(c.delete_course(section_code, term), ADDED_COURSES)
            }
            Action::AddCustomEvent {
                custom_event,
                schedule_indices,
            } => Applied::new(
                c.add_custom_event(custom_event.clone(), schedule_indices)?,
                CUSTOM_EVENTS,
            ),
            Action::DeleteCustomEvent { custom_event_id } => {
                Applied::new(c.delete_custom_event(*custom_event_id), CUSTOM_EVENTS)
            }
            Action::EditCustomEvent {
                edited_custom_event,
                new_schedule_indices,
            } => Applied::new(
                c.edit_custom_event(edited_custom_event, new_schedule_indices)?,
                CUSTOM_EVENTS,
            ),
            Action::ChangeCustomEventColor {
                custom_event_id,
                new_color,
            } => {
                c.change_custom_event_color(*custom_event_id, new_color)?;
                Applied::new(true, COLOR).with_color(ColorKey::CustomEvent(*custom_event_id), new_color)
            }
            Action::ChangeCourseColor {
                section_code,
                term,
                new_color,
            } => {
                let changed = c.change_course_color(section_code, term, new_color);
                let applied = Applied::new(changed, COLOR);
                if changed {
                    applied.with_color(ColorKey::Course(section_code.clone()), new_color)
                } else {
                    applied
                }
            }
            Action::ClearSchedule => Applied::new(c.clear_current_schedule(), CLEARED),
            Action::AddSchedule { new_schedule_name } => {
                c.add_new_schedule(new_schedule_name);
                Applied::new(true, SCHEDULE_ADDED)
            }
            Action::RenameSchedule {
                schedule_index,
                new_schedule_name,
            } => {
                c.rename_schedule(*schedule_index, new_schedule_name)?;
                Applied::new(true, SCHEDULE_NAMES)
            }
            Action::DeleteSchedule { schedule_index } => {
                if c.delete_schedule(*schedule_index)? {
                    Applied::new(true, SCHEDULES_RESHAPED)
                } else {
                    Applied::refused()
                }
            }
            Action::CopySchedule {
                schedule_index,
                new_schedule_name,
            } => {
                c.copy_schedule(*schedule_index, new_schedule_name)?;
                Applied::new(true, SCHEDULES_RESHAPED)
            }
            Action::UpdateScheduleNote {
                schedule_index,
                new_schedule_note,
            } => {
                c.update_schedule_note(*schedule_index, new_schedule_note)?;
                Applied::new(true, SCHEDULE_NOTES)
            }
            Action::Undo => Applied::new(c.revert_state(), UNDONE),
        })
    }

    fn run(&mut self, action: Action) -> Result<Applied, EngineError> {
        self.ensure_writable()?;
        let applied = match self.dispatch(&action) {
            Ok(applied) => applied,
            Err(e) => {
                debug!(tag = action.tag(), error = %e, "mutation rejected");
                return Err(e);
            }
        };
        if applied.refused {
            debug!(tag = action.tag(), "mutation refused");
            return Ok(applied);
        }
        if !applied.changed {
            debug!(tag = action.tag(), "mutation had no effect");
        }

        self.saves.record_mutation();
        self.record(&action);
        if let Some((key, color)) = &applied.color {
            self.colors.notify(key, color);
        }
        self.events.emit_all(applied.notify);
        Ok(applied)
    }

    /// Apply a recorded action exactly as the matching live call would.
    /// Returns whether the collection changed.
    pub fn apply_action(&mut self, action: Action) -> Result<bool, EngineError> {
        self.run(action).map(|applied| applied.changed)
    }

    /// Persist or queue `action` according to the current [`SaveMode`].
    /// Failures here never reach the caller of the mutation.
    fn record(&mut self, action: &Action) {
        if self.replaying {
            return;
        }
        match self.autosave.mode(&self.store) {
            Ok(SaveMode::Autosave { identity }) => {
                self.autosave_now(&identity);
            }
            Ok(SaveMode::Queued) => match self.autosave.enqueue(&mut self.store, action) {
                Ok(outcome) => {
                    if outcome.trimmed > 0 {
                        debug!(trimmed = outcome.trimmed, len = outcome.len, "action log trimmed");
                    }
                }
                Err(e) => warn!(tag = action.tag(), error = %e, "failed to queue action"),
            },
            Err(e) => warn!(error = %e, "could not read autosave settings; action not recorded"),
        }
    }

    fn autosave_now(&mut self, identity: &str) -> bool {
        self.events.emit(AutoSaveStart);
        let state = self.prepared_save_state();
        let ticket = self.saves.begin_save();
        let result = self.backend.persist(identity, &state);
        let succeeded = match &result {
            Ok(()) => {
                debug!(identity, "autosaved");
                true
            }
            Err(e) => {
                warn!(identity, error = %e, "autosave failed");
                false
            }
        };
        self.saves.finish_save(ticket, succeeded);
        self.events.emit(AutoSaveEnd);
        succeeded
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a course to one schedule, or to all of them when `schedule_index`
    /// equals the schedule count. Returns the course as stored.
    pub fn add_course(
        &mut self,
        course: ScheduleCourse,
        schedule_index: usize,
    ) -> Result<ScheduleCourse, EngineError> {
        let applied = self.run(Action::AddCourse {
            course,
            schedule_index,
        })?;
        Ok(applied.course.unwrap_or_default())
    }

    pub fn delete_course(&mut self, section_code: &str, term: &str) -> Result<bool, EngineError> {
        self.apply_action(Action::DeleteCourse {
            section_code: section_code.to_string(),
            term: term.to_string(),
        })
    }

    pub fn add_custom_event(
        &mut self,
        custom_event: CustomEvent,
        schedule_indices: Vec<usize>,
    ) -> Result<bool, EngineError> {
        self.apply_action(Action::AddCustomEvent {
            custom_event,
            schedule_indices,
        })
    }

    pub fn edit_custom_event(
        &mut self,
        edited_custom_event: CustomEvent,
        new_schedule_indices: Vec<usize>,
    ) -> Result<bool, EngineError> {
        self.apply_action(Action::EditCustomEvent {
            edited_custom_event,
            new_schedule_indices,
        })
    }

    pub fn delete_custom_event(&mut self, custom_event_id: CustomEventId) -> Result<bool, EngineError> {
        self.apply_action(Action::DeleteCustomEvent { custom_event_id })
    }

    pub fn change_custom_event_color(
        &mut self,
        custom_event_id: CustomEventId,
        new_color: &str,
    ) -> Result<(), EngineError> {
        self.apply_action(Action::ChangeCustomEventColor {
            custom_event_id,
            new_color: new_color.to_string(),
        })
        .map(|_| ())
    }

    pub fn change_course_color(
        &mut self,
        section_code: &str,
        term: &str,
        new_color: &str,
    ) -> Result<bool, EngineError> {
        self.apply_action(Action::ChangeCourseColor {
            section_code: section_code.to_string(),
            term: term.to_string(),
            new_color: new_color.to_string(),
        })
    }

    pub fn clear_schedule(&mut self) -> Result<bool, EngineError> {
        self.apply_action(Action::ClearSchedule)
    }

    pub fn add_schedule(&mut self, new_schedule_name: &str) -> Result<(), EngineError> {
        self.apply_action(Action::AddSchedule {
            new_schedule_name: new_schedule_name.to_string(),
        })
        .map(|_| ())
    }

    pub fn rename_schedule(
        &mut self,
        schedule_index: usize,
        new_schedule_name: &str,
    ) -> Result<(), EngineError> {
        self.apply_action(Action::RenameSchedule {
            schedule_index,
            new_schedule_name: new_schedule_name.to_string(),
        })
        .map(|_| ())
    }

    /// Returns false when `schedule_index` is the only schedule.
    pub fn delete_schedule(&mut self, schedule_index: usize) -> Result<bool, EngineError> {
        self.apply_action(Action::DeleteSchedule { schedule_index })
    }

    pub fn copy_schedule(
        &mut self,
        schedule_index: usize,
        new_schedule_name: &str,
    ) -> Result<(), EngineError> {
        self.apply_action(Action::CopySchedule {
            schedule_index,
            new_schedule_name: new_schedule_name.to_string(),
        })
        .map(|_| ())
    }

    pub fn update_schedule_note(
        &mut self,
        schedule_index: usize,
        new_schedule_note: &str,
    ) -> Result<(), EngineError> {
        self.apply_action(Action::UpdateScheduleNote {
            schedule_index,
            new_schedule_note: new_schedule_note.to_string(),
        })
        .map(|_| ())
    }

    /// Revert the most recent mutation. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EngineError> {
        self.apply_action(Action::Undo)
    }

    /// Switch the active schedule. Allowed in skeleton mode; never recorded.
    pub fn change_current_schedule(&mut self, index: usize) -> Result<(), EngineError> {
        self.collection.set_current_schedule_index(index)?;
        self.events.emit_all(SCHEDULE_SWITCHED);
        Ok(())
    }

    // ========================================================================
    // Save / load
    // ========================================================================

    fn prepared_save_state(&self) -> ScheduleSaveState {
        let mut state = self.collection.to_save_state();
        let renamed = mangle_duplicate_schedule_names(&mut state.schedules);
        if renamed > 0 {
            debug!(renamed, "disambiguated duplicate schedule names for save");
        }
        state
    }

    /// Start a save for a host that persists asynchronously.
    pub fn begin_save(&self) -> (SaveTicket, ScheduleSaveState) {
        (self.saves.begin_save(), self.prepared_save_state())
    }

    /// Finish a save started with [`Engine::begin_save`]. The unsaved flag is
    /// cleared only if the save succeeded and nothing changed since it began.
    pub fn finish_save(&mut self, ticket: SaveTicket, result: &Result<(), BackendError>) -> bool {
        self.saves.finish_save(ticket, result.is_ok())
    }

    /// Persist the whole collection for `identity`. Duplicate schedule names
    /// are disambiguated in the saved copy. On success the queued action log
    /// is dropped, since the saved state already contains those actions.
    pub fn save_schedule(&mut self, identity: &str) -> Result<(), EngineError> {
        self.ensure_writable()?;
        let (ticket, state) = self.begin_save();
        let result = self.backend.persist(identity, &state);
        self.finish_save(ticket, &result);
        if let Err(e) = result {
            warn!(identity, error = %e, "schedule save failed");
            return Err(e.into());
        }
        self.autosave.log().clear(&mut self.store)?;
        info!(identity, schedules = state.schedules.len(), "schedule saved");
        Ok(())
    }

    /// Load the schedules saved for `identity`, then offer to replay queued
    /// actions on top. Returns `None` when nothing is saved for `identity`.
    /// The previous state stays reachable through undo.
    pub fn load_schedule(
        &mut self,
        identity: &str,
        prompt: &mut dyn ReplayPrompt,
    ) -> Result<Option<ReplayReport>, EngineError> {
        let Some(state) = self.backend.load(identity)? else {
            info!(identity, "no saved schedule");
            return Ok(None);
        };
        self.collection.load_save_state(state);
        self.saves.mark_saved();
        let was_skeleton = std::mem::replace(&mut self.skeleton, false);

        // The collection is already replaced, so a log that cannot be read
        // must not keep subscribers on the old state.
        let report = self.replay_pending(prompt).unwrap_or_else(|e| {
            warn!(identity, error = %e, "could not replay queued actions after load");
            ReplayReport::default()
        });
        self.events.emit_all(LOADED);
        if was_skeleton {
            self.events.emit(SkeletonModeChange);
        }
        info!(
            identity,
            schedules = self.collection.get_number_of_schedules(),
            "schedule loaded"
        );
        Ok(Some(report))
    }

    /// Begin a session with no saved schedule, replaying any queued actions
    /// onto the default collection.
    pub fn start_session(&mut self, prompt: &mut dyn ReplayPrompt) -> Result<ReplayReport, EngineError> {
        let report = self.replay_pending(prompt)?;
        self.events.emit_all(LOADED);
        Ok(report)
    }

    /// Show `state` read-only. Every mutation fails with
    /// [`EngineError::ReadOnly`] until a regular load.
    pub fn load_skeleton_schedule(&mut self, state: ScheduleSaveState) {
        self.collection.reset_to(state);
        self.saves.mark_saved();
        self.skeleton = true;
        self.events.emit_all(LOADED);
        self.events.emit(SkeletonModeChange);
    }

    // ========================================================================
    // Local settings
    // ========================================================================

    pub fn set_autosave(&mut self, enabled: bool) -> Result<(), EngineError> {
        self.store.set_autosave_enabled(enabled)?;
        Ok(())
    }

    /// Remember or forget the identity autosave writes to.
    pub fn set_identity(&mut self, identity: Option<&str>) -> Result<(), EngineError> {
        match identity {
            Some(identity) => self.store.set(LocalKey::Identity, identity)?,
            None => self.store.remove(LocalKey::Identity)?,
        }
        Ok(())
    }

    pub fn save_mode(&self) -> Result<SaveMode, EngineError> {
        Ok(self.autosave.mode(&self.store)?)
    }

    pub fn pending_action_count(&self) -> Result<usize, EngineError> {
        Ok(self.autosave.log().len(&self.store)?)
    }

    pub fn discard_pending_actions(&mut self) -> Result<(), EngineError> {
        self.autosave.log().clear(&mut self.store)?;
        Ok(())
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn subscribe(&mut self, event: ChangeEvent, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.events.subscribe(event, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn register_color_picker(
        &mut self,
        key: ColorKey,
        callback: impl FnMut(&str) + 'static,
    ) -> PickerId {
        self.colors.register(key, callback)
    }

    pub fn unregister_color_picker(&mut self, key: &ColorKey, picker: PickerId) -> bool {
        self.colors.unregister(key, picker)
    }

    pub fn color_channels(&self) -> &ColorChannels {
        &self.colors
    }
}
