use std::collections::{BTreeMap, VecDeque};

use courseplan_core::{CustomEvent, CustomEventId, Schedule};

/// Full copy of collection state taken right before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSnapshot {
    pub schedules: Vec<Schedule>,
    pub custom_events: BTreeMap<CustomEventId, CustomEvent>,
    pub current_schedule_index: usize,
}

/// Stack of pre-mutation snapshots. `revert` pops the newest.
pub struct UndoManager {
    undo_stack: VecDeque<CollectionSnapshot>,
    max_depth: Option<usize>,
}

impl UndoManager {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, snapshot: CollectionSnapshot) {
        self.undo_stack.push_back(snapshot);
        // Enforce depth limit by dropping oldest entry
        if let Some(max_depth) = self.max_depth
            && self.undo_stack.len() > max_depth
        {
            self.undo_stack.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<CollectionSnapshot> {
        self.undo_stack.pop_back()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(index: usize) -> CollectionSnapshot {
        CollectionSnapshot {
            schedules: vec![Schedule::named(format!("S{index}"))],
            custom_events: BTreeMap::new(),
            current_schedule_index: 0,
        }
    }

    #[test]
    fn pops_newest_first() {
        let mut undo = UndoManager::new(None);
        undo.push(snapshot(1));
        undo.push(snapshot(2));
        assert_eq!(undo.depth(), 2);
        assert_eq!(undo.pop(), Some(snapshot(2)));
        assert_eq!(undo.pop(), Some(snapshot(1)));
        assert_eq!(undo.pop(), None);
    }

    #[test]
    fn depth_limit_drops_oldest() {
        let mut undo = UndoManager::new(Some(2));
        for i in 0..5 {
            undo.push(snapshot(i));
        }
        assert_eq!(undo.depth(), 2);
        assert_eq!(undo.pop(), Some(snapshot(4)));
        assert_eq!(undo.pop(), Some(snapshot(3)));
        assert_eq!(undo.pop(), None);
    }
}
