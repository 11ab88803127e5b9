//! Change notifications and per-item color channels.
//!
//! Notifications carry no payload: a subscriber re-reads whatever derived
//! state it displays from the [`Engine`](crate::Engine) when called.

use std::collections::BTreeMap;
use std::fmt;

use courseplan_core::CustomEventId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeEvent {
    AddedCoursesChange,
    CustomEventsChange,
    ColorChange,
    ScheduleNamesChange,
    CurrentScheduleIndexChange,
    ScheduleNotesChange,
    SkeletonModeChange,
    AutoSaveStart,
    AutoSaveEnd,
}

impl ChangeEvent {
    pub const ALL: [ChangeEvent; 9] = [
        Self::AddedCoursesChange,
        Self::CustomEventsChange,
        Self::ColorChange,
        Self::ScheduleNamesChange,
        Self::CurrentScheduleIndexChange,
        Self::ScheduleNotesChange,
        Self::SkeletonModeChange,
        Self::AutoSaveStart,
        Self::AutoSaveEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddedCoursesChange => "addedCoursesChange",
            Self::CustomEventsChange => "customEventsChange",
            Self::ColorChange => "colorChange",
            Self::ScheduleNamesChange => "scheduleNamesChange",
            Self::CurrentScheduleIndexChange => "currentScheduleIndexChange",
            Self::ScheduleNotesChange => "scheduleNotesChange",
            Self::SkeletonModeChange => "skeletonModeChange",
            Self::AutoSaveStart => "autoSaveStart",
            Self::AutoSaveEnd => "autoSaveEnd",
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut()>;

/// Subscribers per [`ChangeEvent`], called in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: BTreeMap<ChangeEvent, Vec<(SubscriptionId, Handler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event: ChangeEvent, handler: impl FnMut() + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers
            .entry(event)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Detach a subscriber. Returns false if it was not attached.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.subscribers.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(sub, _)| *sub != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    pub fn emit(&mut self, event: ChangeEvent) {
        if let Some(handlers) = self.subscribers.get_mut(&event) {
            for (_, handler) in handlers.iter_mut() {
                handler();
            }
        }
    }

    pub fn emit_all(&mut self, events: &[ChangeEvent]) {
        for event in events {
            self.emit(*event);
        }
    }

    pub fn subscriber_count(&self, event: ChangeEvent) -> usize {
        self.subscribers.get(&event).map_or(0, Vec::len)
    }
}

/// Identifies the item a color picker edits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorKey {
    /// Keyed by section code alone; all terms share the channel.
    Course(String),
    CustomEvent(CustomEventId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PickerId(u64);

type ColorCallback = Box<dyn FnMut(&str)>;

/// One notification channel per [`ColorKey`], created on first registration
/// and removed when its last picker unregisters.
#[derive(Default)]
pub struct ColorChannels {
    next_id: u64,
    channels: BTreeMap<ColorKey, Vec<(PickerId, ColorCallback)>>,
}

impl ColorChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: ColorKey, callback: impl FnMut(&str) + 'static) -> PickerId {
        self.next_id += 1;
        let id = PickerId(self.next_id);
        self.channels
            .entry(key)
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    pub fn unregister(&mut self, key: &ColorKey, picker: PickerId) -> bool {
        let Some(pickers) = self.channels.get_mut(key) else {
            return false;
        };
        let before = pickers.len();
        pickers.retain(|(id, _)| *id != picker);
        let removed = pickers.len() != before;
        if pickers.is_empty() {
            self.channels.remove(key);
        }
        removed
    }

    pub fn notify(&mut self, key: &ColorKey, color: &str) {
        if let Some(pickers) = self.channels.get_mut(key) {
            for (_, callback) in pickers.iter_mut() {
                callback(color);
            }
        }
    }

    pub fn subscriber_count(&self, key: &ColorKey) -> usize {
        self.channels.get(key).map_or(0, Vec::len)
    }

    pub fn has_channel(&self, key: &ColorKey) -> bool {
        self.channels.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emit_reaches_only_matching_subscribers() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        bus.subscribe(ChangeEvent::ColorChange, move || log.borrow_mut().push("color"));
        let log = seen.clone();
        let names = bus.subscribe(ChangeEvent::ScheduleNamesChange, move || {
            log.borrow_mut().push("names")
        });

        bus.emit_all(&[ChangeEvent::ScheduleNamesChange, ChangeEvent::ColorChange]);
        assert_eq!(*seen.borrow(), vec!["names", "color"]);

        assert!(bus.unsubscribe(names));
        assert!(!bus.unsubscribe(names));
        bus.emit(ChangeEvent::ScheduleNamesChange);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(bus.subscriber_count(ChangeEvent::ScheduleNamesChange), 0);
    }

    #[test]
    fn names_are_camel_case() {
        assert_eq!(ChangeEvent::AddedCoursesChange.as_str(), "addedCoursesChange");
        assert_eq!(ChangeEvent::AutoSaveEnd.to_string(), "autoSaveEnd");
        assert_eq!(ChangeEvent::ALL.len(), 9);
    }

    #[test]
    fn channel_torn_down_with_last_picker() {
        let mut channels = ColorChannels::new();
        let key = ColorKey::Course("34130".into());
        let colors = Rc::new(RefCell::new(Vec::new()));

        let sink = colors.clone();
        let a = channels.register(key.clone(), move |c| sink.borrow_mut().push(c.to_string()));
        let sink = colors.clone();
        let b = channels.register(key.clone(), move |c| sink.borrow_mut().push(c.to_string()));
        assert_eq!(channels.subscriber_count(&key), 2);

        channels.notify(&key, "#ff0000");
        assert_eq!(colors.borrow().len(), 2);

        assert!(channels.unregister(&key, a));
        assert!(channels.has_channel(&key));
        assert!(channels.unregister(&key, b));
        assert!(!channels.has_channel(&key));
        assert!(!channels.unregister(&key, b));

        channels.notify(&key, "#00ff00");
        assert_eq!(colors.borrow().len(), 2);
    }
}
