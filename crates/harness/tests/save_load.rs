use courseplan_core::{Schedule, ScheduleSaveState};
use courseplan_engine::{
    AlwaysReplay, BackendError, ChangeEvent, Engine, EngineConfig, EngineError, MirroredBackend,
    ReplayReport, ScheduleBackend,
};
use courseplan_harness::fixtures::{MWF, course, custom_event};
use courseplan_harness::{MemoryBackend, TestSession};
use courseplan_storage::SqliteLocalStore;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn save_mangles_duplicate_names_in_saved_copy_only() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine.rename_schedule(0, "Plan")?;
    s.engine.add_schedule("Plan")?;
    s.engine.add_schedule("Plan")?;
    s.engine.save_schedule("peter")?;

    let saved = s.backend.saved("peter").ok_or("nothing saved")?;
    assert_eq!(saved.schedule_names(), vec!["Plan", "Plan (1)", "Plan (2)"]);
    assert_eq!(
        s.engine.collection().get_schedule_names(),
        vec!["Plan", "Plan", "Plan"]
    );
    assert!(!s.engine.unsaved_changes());
    Ok(())
}

#[test]
fn failed_save_propagates_and_keeps_queue() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine.add_schedule("Schedule 2")?;
    s.backend.fail_persist(true);
    assert!(matches!(
        s.engine.save_schedule("peter"),
        Err(EngineError::Backend(BackendError::Unavailable(_)))
    ));
    assert!(s.engine.unsaved_changes());
    assert_eq!(s.engine.pending_action_count()?, 1);
    Ok(())
}

#[test]
fn load_round_trip_with_shared_events() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine.add_schedule("Schedule 2")?;
    s.engine.add_course(course("100"), 2)?;
    s.engine
        .add_custom_event(custom_event(3, "Gym", MWF, "07:00", "08:00"), vec![0, 1])?;
    s.engine.update_schedule_note(1, "backup plan")?;
    s.engine.save_schedule("peter")?;
    let saved_state = s.engine.collection().to_save_state();

    s.reload()?;
    let events = s.record_events();
    let report = s.engine.load_schedule("peter", &mut AlwaysReplay)?;
    assert_eq!(report.map(|r| r.pending), Some(0));
    assert_eq!(s.engine.collection().to_save_state(), saved_state);
    assert!(!s.engine.unsaved_changes());
    assert_eq!(
        *events.borrow(),
        vec![
            ChangeEvent::AddedCoursesChange,
            ChangeEvent::CustomEventsChange,
            ChangeEvent::ScheduleNamesChange,
            ChangeEvent::CurrentScheduleIndexChange,
            ChangeEvent::ScheduleNotesChange,
        ]
    );

    // The pre-load state is one undo away.
    assert!(s.engine.undo()?);
    assert_eq!(s.engine.collection().get_schedule_names(), vec!["Schedule 1"]);
    Ok(())
}

#[test]
fn unreadable_action_log_still_announces_load() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine.add_schedule("Schedule 2")?;
    s.engine.save_schedule("peter")?;

    s.reload()?;
    s.engine
        .store()
        .conn()
        .execute("DROP TABLE local_state", [])?;
    let events = s.record_events();
    let report = s.engine.load_schedule("peter", &mut AlwaysReplay)?;
    assert_eq!(report, Some(ReplayReport::default()));
    assert_eq!(
        s.engine.collection().get_schedule_names(),
        vec!["Schedule 1", "Schedule 2"]
    );
    assert_eq!(
        *events.borrow(),
        vec![
            ChangeEvent::AddedCoursesChange,
            ChangeEvent::CustomEventsChange,
            ChangeEvent::ScheduleNamesChange,
            ChangeEvent::CurrentScheduleIndexChange,
            ChangeEvent::ScheduleNotesChange,
        ]
    );
    Ok(())
}

#[test]
fn load_of_unknown_identity_changes_nothing() -> TestResult {
    let mut s = TestSession::new()?;
    s.engine.add_schedule("Schedule 2")?;
    assert!(s.engine.load_schedule("nobody", &mut AlwaysReplay)?.is_none());
    assert_eq!(s.engine.collection().get_number_of_schedules(), 2);
    Ok(())
}

#[test]
fn load_failure_propagates() -> TestResult {
    let mut s = TestSession::new()?;
    s.backend.fail_load(true);
    assert!(matches!(
        s.engine.load_schedule("peter", &mut AlwaysReplay),
        Err(EngineError::Backend(_))
    ));
    Ok(())
}

#[test]
fn skeleton_preview_is_read_only_until_real_load() -> TestResult {
    let mut s = TestSession::new()?;
    s.backend.seed(
        "peter",
        ScheduleSaveState {
            schedules: vec![Schedule::named("Real")],
            custom_events: Vec::new(),
            current_schedule_index: 0,
        },
    );
    let events = s.record_events();
    s.engine.load_skeleton_schedule(ScheduleSaveState {
        schedules: vec![Schedule::named("Preview A"), Schedule::named("Preview B")],
        custom_events: Vec::new(),
        current_schedule_index: 1,
    });
    assert!(s.engine.is_skeleton());
    assert_eq!(events.borrow().last(), Some(&ChangeEvent::SkeletonModeChange));
    assert!(matches!(
        s.engine.add_course(course("1"), 0),
        Err(EngineError::ReadOnly)
    ));
    s.engine.change_current_schedule(0)?;
    assert_eq!(s.engine.pending_action_count()?, 0);

    s.engine.load_schedule("peter", &mut AlwaysReplay)?;
    assert!(!s.engine.is_skeleton());
    assert_eq!(s.engine.collection().get_schedule_names(), vec!["Real"]);
    s.engine.add_course(course("1"), 0)?;
    Ok(())
}

#[test]
fn mirrored_backend_tolerates_secondary_failure() -> TestResult {
    let primary = MemoryBackend::new();
    let secondary = MemoryBackend::new();
    secondary.fail_persist(true);
    let mut engine = Engine::new(
        EngineConfig::default(),
        SqliteLocalStore::open_in_memory()?,
        MirroredBackend::new(primary.clone(), secondary.clone()),
    );
    engine.add_schedule("Schedule 2")?;
    engine.save_schedule("peter")?;
    assert!(primary.saved("peter").is_some());
    assert!(secondary.saved("peter").is_none());
    assert_eq!(secondary.persist_calls(), 1);

    primary.fail_persist(true);
    secondary.fail_persist(false);
    assert!(engine.save_schedule("peter").is_err());
    assert!(secondary.saved("peter").is_some());
    Ok(())
}

#[test]
fn hydrate_repairs_saved_state() -> TestResult {
    let mut s = TestSession::new()?;
    let mut broken = Schedule::named("Broken");
    broken.courses = vec![course("1"), course("1")];
    let mut event = custom_event(4, "Gym", MWF, "07:00", "08:00");
    event.schedule_indices = [0, 3].into_iter().collect();
    let mut backend = s.backend.clone();
    backend.persist(
        "peter",
        &ScheduleSaveState {
            schedules: vec![broken],
            custom_events: vec![event],
            current_schedule_index: 5,
        },
    )?;

    s.engine.load_schedule("peter", &mut AlwaysReplay)?;
    let collection = s.engine.collection();
    assert_eq!(collection.get_current_schedule_index(), 0);
    assert_eq!(collection.get_current_courses().len(), 1);
    assert_eq!(collection.custom_events_in(0).len(), 1);
    Ok(())
}
