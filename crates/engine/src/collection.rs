use std::collections::{BTreeMap, BTreeSet, HashSet};

use courseplan_core::names::next_schedule_name;
use courseplan_core::{
    CustomEvent, CustomEventId, Schedule, ScheduleCourse, ScheduleSaveState, SectionKey,
};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::undo::{CollectionSnapshot, UndoManager};

/// The ordered schedules of one session, the custom events they share, the
/// active schedule and the undo history.
///
/// Every validated mutation pushes a snapshot of the prior state, even one
/// that turns out to change nothing. Deleting the only schedule is refused
/// before the snapshot.
pub struct ScheduleCollection {
    schedules: Vec<Schedule>,
    custom_events: BTreeMap<CustomEventId, CustomEvent>,
    current_schedule_index: usize,
    undo: UndoManager,
    palette: Vec<String>,
    default_schedule_name: String,
    custom_event_color: String,
    /// Highest custom event id seen this session. Not part of snapshots, so
    /// ids are never handed out twice even across undo.
    custom_event_high_water: Option<CustomEventId>,
}

impl ScheduleCollection {
    pub fn new(config: &EngineConfig) -> Self {
        let mut collection = Self {
            schedules: Vec::new(),
            custom_events: BTreeMap::new(),
            current_schedule_index: 0,
            undo: UndoManager::new(config.undo_depth),
            palette: config.color_palette.clone(),
            default_schedule_name: config.default_schedule_name.clone(),
            custom_event_color: config.custom_event_color.clone(),
            custom_event_high_water: None,
        };
        collection.schedules.push(collection.default_schedule());
        collection
    }

    fn default_schedule(&self) -> Schedule {
        Schedule::named(format!("{} 1", self.default_schedule_name))
    }

    fn capture(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            schedules: self.schedules.clone(),
            custom_events: self.custom_events.clone(),
            current_schedule_index: self.current_schedule_index,
        }
    }

    fn restore(&mut self, snapshot: CollectionSnapshot) {
        self.schedules = snapshot.schedules;
        self.custom_events = snapshot.custom_events;
        self.current_schedule_index = snapshot.current_schedule_index;
    }

    fn require_index(&self, index: usize) -> Result<(), EngineError> {
        if index < self.schedules.len() {
            Ok(())
        } else {
            Err(EngineError::ScheduleIndexOutOfRange {
                index,
                count: self.schedules.len(),
            })
        }
    }

    fn require_indices(&self, indices: &[usize]) -> Result<(), EngineError> {
        indices.iter().try_for_each(|index| self.require_index(*index))
    }

    fn note_custom_event_id(&mut self, id: CustomEventId) {
        if self.custom_event_high_water.is_none_or(|high| id > high) {
            self.custom_event_high_water = Some(id);
        }
    }

    /// Record the current state for `revert_state`. Called by every mutation
    /// once its arguments have been validated, whether or not it ends up
    /// changing anything.
    fn checkpoint(&mut self) {
        let snapshot = self.capture();
        self.undo.push(snapshot);
    }

    // ========================================================================
    // Courses
    // ========================================================================

    fn existing_color(&self, section_code: &str, term: &str) -> Option<String> {
        self.schedules
            .iter()
            .find_map(|s| s.find_course(section_code, term))
            .map(|c| c.color.clone())
            .filter(|color| !color.is_empty())
    }

    fn assign_color(&self, course: &ScheduleCourse, targets: &[usize]) -> String {
        if let Some(color) = self.existing_color(&course.section_code, &course.term) {
            return color;
        }
        if !course.color.is_empty() {
            return course.color.clone();
        }
        let used: HashSet<&str> = targets
            .iter()
            .flat_map(|i| self.schedules[*i].courses.iter().map(|c| c.color.as_str()))
            .collect();
        if let Some(free) = self.palette.iter().find(|c| !used.contains(c.as_str())) {
            return free.clone();
        }
        let count: usize = targets.iter().map(|i| self.schedules[*i].courses.len()).sum();
        self.palette
            .get(count % self.palette.len().max(1))
            .cloned()
            .unwrap_or_default()
    }

    /// Add `course` to the schedule at `schedule_index`, or to every schedule
    /// when `schedule_index` equals the schedule count. Adding a section that
    /// is already present returns the existing entry unchanged.
    ///
    /// The returned flag is false when no schedule gained the course.
    pub fn add_course(
        &mut self,
        course: ScheduleCourse,
        schedule_index: usize,
    ) -> Result<(bool, ScheduleCourse), EngineError> {
        let count = self.schedules.len();
        let targets: Vec<usize> = if schedule_index == count {
            (0..count).collect()
        } else {
            self.require_index(schedule_index)?;
            vec![schedule_index]
        };
        self.checkpoint();

        let missing: Vec<usize> = targets
            .iter()
            .copied()
            .filter(|i| !self.schedules[*i].has_course(&course.section_code, &course.term))
            .collect();

        if missing.is_empty() {
            let existing = self.schedules[targets[0]]
                .find_course(&course.section_code, &course.term)
                .cloned()
                .unwrap_or(course);
            debug!(section = %existing.key(), "course already added");
            return Ok((false, existing));
        }

        let color = self.assign_color(&course, &missing);
        let added = ScheduleCourse { color, ..course };
        for index in &missing {
            self.schedules[*index].courses.push(added.clone());
        }
        Ok((true, added))
    }

    /// Remove a section from the active schedule.
    pub fn delete_course(&mut self, section_code: &str, term: &str) -> bool {
        self.checkpoint();
        let courses = &mut self.schedules[self.current_schedule_index].courses;
        let before = courses.len();
        courses.retain(|c| !c.is_section(section_code, term));
        courses.len() != before
    }

    /// Recolor a section everywhere it appears.
    pub fn change_course_color(&mut self, section_code: &str, term: &str, color: &str) -> bool {
        self.checkpoint();
        let mut found = false;
        for course in self
            .schedules
            .iter_mut()
            .flat_map(|s| s.courses.iter_mut())
            .filter(|c| c.is_section(section_code, term))
        {
            course.color = color.to_string();
            found = true;
        }
        found
    }

    // ========================================================================
    // Custom events
    // ========================================================================

    fn attach_event(&mut self, id: CustomEventId, index: usize) {
        let list = &mut self.schedules[index].custom_events;
        if !list.contains(&id) {
            list.push(id);
        }
    }

    fn detach_event(&mut self, id: CustomEventId, index: usize) {
        self.schedules[index].custom_events.retain(|e| *e != id);
    }

    /// Add `event` to each listed schedule. An id that already exists gains
    /// the new schedules; its fields are left as they were.
    pub fn add_custom_event(
        &mut self,
        event: CustomEvent,
        schedule_indices: &[usize],
    ) -> Result<bool, EngineError> {
        self.require_indices(schedule_indices)?;
        self.checkpoint();
        let id = event.custom_event_id;
        self.note_custom_event_id(id);

        let already: BTreeSet<usize> = self
            .custom_events
            .get(&id)
            .map(|e| e.schedule_indices.clone())
            .unwrap_or_default();
        if schedule_indices.iter().all(|i| already.contains(i)) {
            return Ok(false);
        }

        let default_color = self.custom_event_color.clone();
        let entry = self.custom_events.entry(id).or_insert_with(|| {
            let mut fresh = event;
            fresh.schedule_indices.clear();
            if fresh.color.is_empty() {
                fresh.color = default_color;
            }
            fresh
        });
        entry.schedule_indices.extend(schedule_indices.iter().copied());
        for index in schedule_indices {
            self.attach_event(id, *index);
        }
        Ok(true)
    }

    /// Replace an event's fields and move it to exactly `new_schedule_indices`.
    /// An event left in no schedule is removed. Unknown ids are ignored.
    pub fn edit_custom_event(
        &mut self,
        edited: &CustomEvent,
        new_schedule_indices: &[usize],
    ) -> Result<bool, EngineError> {
        self.require_indices(new_schedule_indices)?;
        self.checkpoint();
        let id = edited.custom_event_id;
        let Some(old_set) = self.custom_events.get(&id).map(|e| e.schedule_indices.clone())
        else {
            debug!(custom_event = %id, "edit of unknown custom event ignored");
            return Ok(false);
        };

        let new_set: BTreeSet<usize> = new_schedule_indices.iter().copied().collect();
        for index in old_set.difference(&new_set) {
            self.detach_event(id, *index);
        }
        for index in new_set.difference(&old_set) {
            self.attach_event(id, *index);
        }
        if new_set.is_empty() {
            self.custom_events.remove(&id);
        } else if let Some(event) = self.custom_events.get_mut(&id) {
            event.apply_edit(edited);
            event.schedule_indices = new_set;
        }
        Ok(true)
    }

    /// Remove an event from the collection and from every schedule.
    pub fn delete_custom_event(&mut self, id: CustomEventId) -> bool {
        self.checkpoint();
        if self.custom_events.remove(&id).is_none() {
            return false;
        }
        for schedule in &mut self.schedules {
            schedule.custom_events.retain(|e| *e != id);
        }
        true
    }

    pub fn change_custom_event_color(
        &mut self,
        id: CustomEventId,
        color: &str,
    ) -> Result<(), EngineError> {
        if !self.custom_events.contains_key(&id) {
            return Err(EngineError::CustomEventNotFound(id));
        }
        self.checkpoint();
        if let Some(event) = self.custom_events.get_mut(&id) {
            event.color = color.to_string();
        }
        Ok(())
    }

    /// An id greater than any custom event id seen this session.
    pub fn next_custom_event_id(&self) -> CustomEventId {
        self.custom_event_high_water
            .map_or(CustomEventId::new(1), |high| high.successor())
    }

    fn drop_orphaned_events(&mut self) {
        self.custom_events
            .retain(|_, event| !event.schedule_indices.is_empty());
    }

    // ========================================================================
    // Schedules
    // ========================================================================

    /// Append an empty schedule and make it active. Names are not
    /// de-duplicated here.
    pub fn add_new_schedule(&mut self, name: &str) {
        self.checkpoint();
        self.schedules.push(Schedule::named(name));
        self.current_schedule_index = self.schedules.len() - 1;
    }

    pub fn rename_schedule(&mut self, index: usize, name: &str) -> Result<(), EngineError> {
        self.require_index(index)?;
        self.checkpoint();
        self.schedules[index].name = name.to_string();
        Ok(())
    }

    /// Remove a schedule. The last remaining schedule cannot be deleted:
    /// that call returns false and leaves the undo stack alone.
    pub fn delete_schedule(&mut self, index: usize) -> Result<bool, EngineError> {
        self.require_index(index)?;
        let count = self.schedules.len();
        if count == 1 {
            debug!("refusing to delete the only schedule");
            return Ok(false);
        }
        self.checkpoint();
        self.schedules.remove(index);
        for event in self.custom_events.values_mut() {
            event.schedule_indices = event
                .schedule_indices
                .iter()
                .filter(|i| **i != index)
                .map(|i| if *i > index { i - 1 } else { *i })
                .collect();
        }
        self.drop_orphaned_events();
        self.current_schedule_index = self.current_schedule_index.min(count - 2);
        Ok(true)
    }

    /// Append a copy of the schedule at `from_index` under `name` and make it
    /// active. Custom events stay shared with the source.
    pub fn copy_schedule(&mut self, from_index: usize, name: &str) -> Result<(), EngineError> {
        self.require_index(from_index)?;
        self.checkpoint();
        let source = &self.schedules[from_index];
        let copy = Schedule {
            name: name.to_string(),
            courses: source.courses.clone(),
            custom_events: source.custom_events.clone(),
            note: String::new(),
        };
        let new_index = self.schedules.len();
        for id in &copy.custom_events {
            if let Some(event) = self.custom_events.get_mut(id) {
                event.schedule_indices.insert(new_index);
            }
        }
        self.schedules.push(copy);
        self.current_schedule_index = new_index;
        Ok(())
    }

    /// Remove every course and custom event from the active schedule.
    pub fn clear_current_schedule(&mut self) -> bool {
        self.checkpoint();
        let current = self.current_schedule_index;
        let schedule = &mut self.schedules[current];
        let had_content = !schedule.courses.is_empty() || !schedule.custom_events.is_empty();
        schedule.courses.clear();
        let ids = std::mem::take(&mut schedule.custom_events);
        for id in ids {
            if let Some(event) = self.custom_events.get_mut(&id) {
                event.schedule_indices.remove(&current);
            }
        }
        self.drop_orphaned_events();
        had_content
    }

    pub fn update_schedule_note(&mut self, index: usize, note: &str) -> Result<(), EngineError> {
        self.require_index(index)?;
        self.checkpoint();
        self.schedules[index].note = note.to_string();
        Ok(())
    }

    /// Switch the active schedule. Not recorded for undo.
    pub fn set_current_schedule_index(&mut self, index: usize) -> Result<(), EngineError> {
        self.require_index(index)?;
        self.current_schedule_index = index;
        Ok(())
    }

    // ========================================================================
    // Undo
    // ========================================================================

    /// Restore the state from before the most recent mutation.
    pub fn revert_state(&mut self) -> bool {
        match self.undo.pop() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.depth()
    }

    // ========================================================================
    // Save state
    // ========================================================================

    pub fn to_save_state(&self) -> ScheduleSaveState {
        ScheduleSaveState {
            schedules: self.schedules.clone(),
            custom_events: self.custom_events.values().cloned().collect(),
            current_schedule_index: self.current_schedule_index,
        }
    }

    /// Replace the whole state with a loaded save state, repairing anything
    /// inconsistent: duplicate sections, dangling event ids, out-of-range
    /// indices. The replaced state can be restored with `revert_state`.
    pub fn load_save_state(&mut self, state: ScheduleSaveState) {
        self.checkpoint();
        self.hydrate(state);
    }

    /// Like `load_save_state` but also forgets the undo history.
    pub fn reset_to(&mut self, state: ScheduleSaveState) {
        self.hydrate(state);
        self.undo.clear();
    }

    fn hydrate(&mut self, state: ScheduleSaveState) {
        let mut schedules = state.schedules;
        if schedules.is_empty() {
            schedules.push(self.default_schedule());
        }
        for schedule in &mut schedules {
            let mut seen = HashSet::new();
            schedule.courses.retain(|c| seen.insert(c.key()));
        }

        let count = schedules.len();
        let mut events: BTreeMap<CustomEventId, CustomEvent> = BTreeMap::new();
        for mut event in state.custom_events {
            if events.contains_key(&event.custom_event_id) {
                continue;
            }
            event.schedule_indices.retain(|i| *i < count);
            events.insert(event.custom_event_id, event);
        }
        for (index, schedule) in schedules.iter().enumerate() {
            for id in &schedule.custom_events {
                if let Some(event) = events.get_mut(id) {
                    event.schedule_indices.insert(index);
                }
            }
        }
        events.retain(|_, event| !event.schedule_indices.is_empty());
        for schedule in &mut schedules {
            schedule.custom_events.clear();
        }
        for event in events.values() {
            for index in &event.schedule_indices {
                schedules[*index].custom_events.push(event.custom_event_id);
            }
        }

        self.current_schedule_index = state.current_schedule_index.min(count - 1);
        self.schedules = schedules;
        self.custom_events = events;
        let ids: Vec<CustomEventId> = self.custom_events.keys().copied().collect();
        for id in ids {
            self.note_custom_event_id(id);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn schedule(&self, index: usize) -> Option<&Schedule> {
        self.schedules.get(index)
    }

    pub fn current_schedule(&self) -> &Schedule {
        &self.schedules[self.current_schedule_index]
    }

    pub fn get_current_schedule_index(&self) -> usize {
        self.current_schedule_index
    }

    pub fn get_number_of_schedules(&self) -> usize {
        self.schedules.len()
    }

    pub fn get_schedule_names(&self) -> Vec<&str> {
        self.schedules.iter().map(|s| s.name.as_str()).collect()
    }

    /// Propose a schedule name not currently in use.
    pub fn get_next_schedule_name(&self, count: usize, base: &str) -> String {
        next_schedule_name(&self.get_schedule_names(), count, base)
    }

    pub fn default_schedule_name(&self) -> &str {
        &self.default_schedule_name
    }

    pub fn get_current_courses(&self) -> &[ScheduleCourse] {
        &self.current_schedule().courses
    }

    /// Courses of every schedule, in schedule order.
    pub fn get_all_courses(&self) -> Vec<&ScheduleCourse> {
        self.schedules.iter().flat_map(|s| s.courses.iter()).collect()
    }

    pub fn get_all_custom_events(&self) -> Vec<&CustomEvent> {
        self.custom_events.values().collect()
    }

    pub fn custom_event(&self, id: CustomEventId) -> Option<&CustomEvent> {
        self.custom_events.get(&id)
    }

    /// Custom events of one schedule in the order they were added to it.
    pub fn custom_events_in(&self, index: usize) -> Vec<&CustomEvent> {
        self.schedules
            .get(index)
            .map(|s| {
                s.custom_events
                    .iter()
                    .filter_map(|id| self.custom_events.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_added_section_codes(&self) -> BTreeSet<SectionKey> {
        self.current_schedule()
            .courses
            .iter()
            .map(ScheduleCourse::key)
            .collect()
    }

    pub fn get_current_schedule_note(&self) -> &str {
        &self.current_schedule().note
    }

    /// `term` together with every term already in the active schedule.
    pub fn terms_in_schedule(&self, term: &str) -> BTreeSet<String> {
        std::iter::once(term.to_string())
            .chain(self.current_schedule().courses.iter().map(|c| c.term.clone()))
            .collect()
    }
}
