
use rosterd::error::{ErrorKind, RosterError};
use rosterd::notify::NotificationType;
use rosterd::shift::{GeoPoint, ShiftStatus};
use uuid::Uuid;

use test_harness::{utc, TestEngine};

#[tokio::test]
async fn check_in_records_time_and_geo() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 2));

    let row = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, Some(GeoPoint { lat: 40.7, lng: -74.0 }))
        .await
        .unwrap();

    assert_eq!(row.check_in_time, Some(utc(2025, 1, 10, 9, 2)));
    assert_eq!(row.check_in_lat, Some(40.7));
    assert_eq!(row.check_in_lng, Some(-74.0));
    assert!(!row.is_late_check_in);
}

#[tokio::test]
async fn check_in_within_grace_is_not_late() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 10));

    let row = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    assert!(!row.is_late_check_in);
}

#[tokio::test]
async fn check_in_exactly_on_grace_boundary_is_not_late() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 15));

    let row = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    assert!(!row.is_late_check_in);
}

#[tokio::test]
async fn check_in_past_grace_is_late() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 16));

    let row = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    assert!(row.is_late_check_in);
}

#[tokio::test]
async fn configured_grace_changes_lateness_boundary() {
    let t = TestEngine::with_config(
        rosterd::config::EngineConfig::default().with_late_grace_mins(5),
    )
    .await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 10));

    let row = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    assert!(row.is_late_check_in);
}

#[tokio::test]
async fn first_check_in_starts_shift_and_notifies_creator() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 0));

    t.engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();

    let updated = t.engine.lifecycle().shift(shift.id).await.unwrap();
    assert_eq!(updated.status, ShiftStatus::InProgress);
    assert_eq!(t.notifier.count_of(NotificationType::ShiftStarted), 1);
    assert_eq!(t.notifier.count_of(NotificationType::WorkerCheckedIn), 1);
}

#[tokio::test]
async fn double_check_in_conflicts() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 0));
    t.engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();

    let err = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::AlreadyCheckedIn { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn check_in_without_assignment_is_not_found() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;

    let err = t
        .engine
        .attendance()
        .check_in(shift.id, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::AssignmentNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn check_in_against_missed_shift_is_rejected() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 11, 0));
    assert_eq!(t.engine.sweeper().sweep_once().await, 1);

    let err = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::ShiftClosed { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let unchanged = t.engine.lifecycle().shift(shift.id).await.unwrap();
    assert_eq!(unchanged.status, ShiftStatus::Missed);
}

#[tokio::test]
async fn check_out_before_check_in_is_rejected() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 17, 0));

    let err = t
        .engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::MustCheckInFirst { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn check_out_in_same_instant_as_check_in_is_rejected() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 0));
    t.engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();

    let err = t
        .engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::CheckOutNotAfterCheckIn { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let row = t.engine.attendance().assignment(shift.id, t.worker).await.unwrap();
    assert!(row.check_out_time.is_none());
    assert_eq!(row.hours_worked, None);
}

#[tokio::test]
async fn double_check_out_conflicts() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 0));
    t.engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    t.clock.set(utc(2025, 1, 10, 17, 0));
    t.engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap();

    let err = t
        .engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::AlreadyCheckedOut { .. }));
}

#[tokio::test]
async fn check_out_computes_hours_for_ninety_minutes() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 0));
    t.engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();

    // 5,400,000 ms later
    t.clock.set(utc(2025, 1, 10, 10, 30));
    let row = t
        .engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap();
    assert_eq!(row.hours_worked, Some(1.5));
}

#[tokio::test]
async fn last_check_out_completes_shift() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    let other = t.add_worker("Sam Reed").await;
    t.engine
        .lifecycle()
        .assign_workers(shift.id, t.provider, &[other])
        .await
        .unwrap();

    t.clock.set(utc(2025, 1, 10, 9, 0));
    t.engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    t.engine
        .attendance()
        .check_in(shift.id, other, None)
        .await
        .unwrap();

    t.clock.set(utc(2025, 1, 10, 17, 0));
    t.engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap();
    let mid = t.engine.lifecycle().shift(shift.id).await.unwrap();
    assert_eq!(mid.status, ShiftStatus::InProgress);

    t.engine
        .attendance()
        .check_out(shift.id, other, None)
        .await
        .unwrap();
    let done = t.engine.lifecycle().shift(shift.id).await.unwrap();
    assert_eq!(done.status, ShiftStatus::Completed);
    assert_eq!(t.notifier.count_of(NotificationType::ShiftCompleted), 1);
}

#[tokio::test]
async fn full_shift_scenario() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    assert_eq!(shift.status, ShiftStatus::Scheduled);

    t.clock.set(utc(2025, 1, 10, 9, 5));
    let row = t
        .engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    assert!(!row.is_late_check_in);
    assert_eq!(
        t.engine.lifecycle().shift(shift.id).await.unwrap().status,
        ShiftStatus::InProgress
    );

    t.clock.set(utc(2025, 1, 10, 17, 2));
    let row = t
        .engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap();
    assert_eq!(row.hours_worked, Some(7.95));
    assert_eq!(
        t.engine.lifecycle().shift(shift.id).await.unwrap().status,
        ShiftStatus::Completed
    );
}

#[tokio::test]
async fn rating_by_creator_is_recorded() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;

    let row = t
        .engine
        .attendance()
        .add_rating(shift.id, t.worker, t.provider, 4, Some("Solid work".to_string()))
        .await
        .unwrap();
    assert_eq!(row.rating, Some(4));
    assert_eq!(row.feedback.as_deref(), Some("Solid work"));
}

#[tokio::test]
async fn rating_by_non_creator_is_forbidden() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;

    let err = t
        .engine
        .attendance()
        .add_rating(shift.id, t.worker, Uuid::new_v4(), 4, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::NotShiftCreator(_)));
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn rating_out_of_range_is_rejected() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;

    for rating in [0u8, 6] {
        let err = t
            .engine
            .attendance()
            .add_rating(shift.id, t.worker, t.provider, rating, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::InvalidRating(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}

#[tokio::test]
async fn rating_last_write_wins() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;

    t.engine
        .attendance()
        .add_rating(shift.id, t.worker, t.provider, 2, Some("Late twice".to_string()))
        .await
        .unwrap();
    let row = t
        .engine
        .attendance()
        .add_rating(shift.id, t.worker, t.provider, 5, None)
        .await
        .unwrap();

    assert_eq!(row.rating, Some(5));
    assert!(row.feedback.is_none());
}
