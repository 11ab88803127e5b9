use std::cell::RefCell;
use std::rc::Rc;

use courseplan_core::CustomEventId;
use courseplan_engine::ChangeEvent::{self, *};
use courseplan_engine::ColorKey;
use courseplan_harness::TestSession;
use courseplan_harness::fixtures::{MWF, TERM, course, custom_event, lecture};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn drain(log: &Rc<RefCell<Vec<ChangeEvent>>>) -> Vec<ChangeEvent> {
    std::mem::take(&mut *log.borrow_mut())
}

#[test]
fn each_operation_emits_its_notifications() -> TestResult {
    let mut s = TestSession::new()?;
    let log = s.record_events();

    s.engine.add_course(course("100"), 0)?;
    assert_eq!(drain(&log), vec![AddedCoursesChange]);

    s.engine.delete_course("100", TERM)?;
    assert_eq!(drain(&log), vec![AddedCoursesChange]);

    s.engine
        .add_custom_event(custom_event(1, "Gym", MWF, "07:00", "08:00"), vec![0])?;
    assert_eq!(drain(&log), vec![CustomEventsChange]);

    s.engine
        .edit_custom_event(custom_event(1, "Run", MWF, "07:00", "08:00"), vec![0])?;
    assert_eq!(drain(&log), vec![CustomEventsChange]);

    s.engine.change_custom_event_color(CustomEventId::new(1), "#abcdef")?;
    assert_eq!(drain(&log), vec![ColorChange]);

    s.engine.delete_custom_event(CustomEventId::new(1))?;
    assert_eq!(drain(&log), vec![CustomEventsChange]);

    s.engine.clear_schedule()?;
    assert_eq!(drain(&log), vec![AddedCoursesChange, CustomEventsChange]);

    s.engine.add_schedule("Schedule 2")?;
    assert_eq!(
        drain(&log),
        vec![ScheduleNamesChange, CurrentScheduleIndexChange, ScheduleNotesChange]
    );

    s.engine.rename_schedule(1, "Two")?;
    assert_eq!(drain(&log), vec![ScheduleNamesChange]);

    let reshaped = vec![
        ScheduleNamesChange,
        CurrentScheduleIndexChange,
        AddedCoursesChange,
        CustomEventsChange,
        ScheduleNotesChange,
    ];
    s.engine.copy_schedule(0, "Three")?;
    assert_eq!(drain(&log), reshaped);
    s.engine.delete_schedule(2)?;
    assert_eq!(drain(&log), reshaped);

    s.engine.update_schedule_note(0, "note")?;
    assert_eq!(drain(&log), vec![ScheduleNotesChange]);

    s.engine.change_current_schedule(0)?;
    assert_eq!(drain(&log), vec![CurrentScheduleIndexChange, ScheduleNotesChange]);

    s.engine.undo()?;
    assert_eq!(
        drain(&log),
        vec![
            AddedCoursesChange,
            CustomEventsChange,
            ColorChange,
            ScheduleNamesChange,
            CurrentScheduleIndexChange,
            ScheduleNotesChange,
        ]
    );
    Ok(())
}

#[test]
fn unsubscribed_handlers_stop_firing() -> TestResult {
    let mut s = TestSession::new()?;
    let count = Rc::new(RefCell::new(0));
    let counter = count.clone();
    let id = s
        .engine
        .subscribe(ScheduleNamesChange, move || *counter.borrow_mut() += 1);
    s.engine.add_schedule("A")?;
    assert!(s.engine.unsubscribe(id));
    s.engine.add_schedule("B")?;
    assert_eq!(*count.borrow(), 1);
    Ok(())
}

#[test]
fn course_color_pickers_receive_new_color() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine.add_course(lecture("34130", MWF, "10:00", "10:50"), 0)?;
    let key = ColorKey::Course("34130".into());

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let first = s
        .engine
        .register_color_picker(key.clone(), move |c| sink.borrow_mut().push(format!("a {c}")));
    let sink = seen.clone();
    let second = s
        .engine
        .register_color_picker(key.clone(), move |c| sink.borrow_mut().push(format!("b {c}")));

    s.engine.change_course_color("34130", TERM, "#ff0000")?;
    assert_eq!(*seen.borrow(), vec!["a #ff0000", "b #ff0000"]);

    assert!(s.engine.unregister_color_picker(&key, first));
    assert_eq!(s.engine.color_channels().subscriber_count(&key), 1);
    assert!(s.engine.unregister_color_picker(&key, second));
    assert!(!s.engine.color_channels().has_channel(&key));

    s.engine.change_course_color("34130", TERM, "#00ff00")?;
    assert_eq!(seen.borrow().len(), 2);
    Ok(())
}

#[test]
fn custom_event_pickers_are_keyed_by_id() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine
        .add_custom_event(custom_event(1, "Gym", MWF, "07:00", "08:00"), vec![0])?;
    s.engine
        .add_custom_event(custom_event(2, "Work", MWF, "09:00", "17:00"), vec![0])?;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    s.engine
        .register_color_picker(ColorKey::CustomEvent(CustomEventId::new(2)), move |c| {
            sink.borrow_mut().push(c.to_string())
        });

    s.engine.change_custom_event_color(CustomEventId::new(1), "#111111")?;
    s.engine.change_custom_event_color(CustomEventId::new(2), "#222222")?;
    assert_eq!(*seen.borrow(), vec!["#222222".to_string()]);
    Ok(())
}

#[test]
fn calendar_views_follow_active_schedule() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine.add_course(lecture("100", MWF, "10:00", "10:50"), 0)?;
    s.engine
        .add_custom_event(custom_event(1, "Gym", MWF, "07:00", "08:00"), vec![0])?;
    let collection = s.engine.collection();
    assert_eq!(collection.get_calendarized_events().len(), 6);
    assert_eq!(collection.get_calendarized_finals().len(), 1);
    assert_eq!(collection.get_events_with_finals().len(), 7);
    Ok(())
}
