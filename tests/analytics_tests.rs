
use rosterd::analytics::AnalyticsFilter;
use rosterd::shift::{CreateShiftParams, Shift};
use uuid::Uuid;

use test_harness::{utc, window, TestEngine};

/// Two completed shifts (2h and 3h worked, rated 5 and 4) and one missed
/// shift, all on 2025-01-10 under the seeded provider.
async fn seed_scenario(t: &TestEngine) -> (Shift, Shift, Shift, Uuid, Uuid) {
    let worker_b = t.add_worker("Sam Reed").await;
    let app_b = t.add_application(worker_b).await;
    let worker_c = t.add_worker("Noor Khan").await;
    let app_c = t.add_application(worker_c).await;

    let shift_a = t
        .engine
        .lifecycle()
        .create_shift(CreateShiftParams {
            window: window(2025, 1, 10, (9, 0), (11, 0)),
            ..t.default_params()
        })
        .await
        .unwrap();
    let shift_b = t
        .engine
        .lifecycle()
        .create_shift(CreateShiftParams {
            application_id: app_b,
            worker_id: worker_b,
            window: window(2025, 1, 10, (12, 0), (15, 0)),
            ..t.default_params()
        })
        .await
        .unwrap();
    let shift_c = t
        .engine
        .lifecycle()
        .create_shift(CreateShiftParams {
            application_id: app_c,
            worker_id: worker_c,
            window: window(2025, 1, 10, (9, 30), (17, 0)),
            ..t.default_params()
        })
        .await
        .unwrap();

    t.clock.set(utc(2025, 1, 10, 9, 0));
    t.engine
        .attendance()
        .check_in(shift_a.id, t.worker, None)
        .await
        .unwrap();
    t.clock.set(utc(2025, 1, 10, 11, 0));
    t.engine
        .attendance()
        .check_out(shift_a.id, t.worker, None)
        .await
        .unwrap();

    t.clock.set(utc(2025, 1, 10, 12, 0));
    t.engine
        .attendance()
        .check_in(shift_b.id, worker_b, None)
        .await
        .unwrap();
    t.clock.set(utc(2025, 1, 10, 15, 0));
    t.engine
        .attendance()
        .check_out(shift_b.id, worker_b, None)
        .await
        .unwrap();

    t.engine
        .attendance()
        .add_rating(shift_a.id, t.worker, t.provider, 5, None)
        .await
        .unwrap();
    t.engine
        .attendance()
        .add_rating(shift_b.id, worker_b, t.provider, 4, None)
        .await
        .unwrap();

    // shift_c never sees a check-in and gets swept.
    t.clock.set(utc(2025, 1, 10, 16, 0));
    assert_eq!(t.engine.sweeper().sweep_once().await, 1);

    (shift_a, shift_b, shift_c, worker_b, worker_c)
}

#[tokio::test]
async fn summary_totals_and_attendance_rate() {
    let t = TestEngine::new().await;
    seed_scenario(&t).await;

    let summary = t
        .engine
        .analytics()
        .provider_shift_analytics(t.provider, &AnalyticsFilter::default())
        .await
        .unwrap();

    assert_eq!(summary.total_shifts, 3);
    assert_eq!(summary.status_counts.completed, 2);
    assert_eq!(summary.status_counts.missed, 1);
    assert_eq!(summary.status_counts.scheduled, 0);
    assert_eq!(summary.total_worked_hours, 5.0);
    // 2h + 3h + 7.5h scheduled
    assert_eq!(summary.total_scheduled_hours, 12.5);
    assert_eq!(summary.total_assignments, 3);
    assert_eq!(summary.checked_in_count, 2);
    assert!((summary.attendance_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(summary.late_check_in_count, 0);
}

#[tokio::test]
async fn per_worker_rollup() {
    let t = TestEngine::new().await;
    let (_, _, _, worker_b, worker_c) = seed_scenario(&t).await;

    let summary = t
        .engine
        .analytics()
        .provider_shift_analytics(t.provider, &AnalyticsFilter::default())
        .await
        .unwrap();

    assert_eq!(summary.workers.len(), 3);
    let ids: Vec<Uuid> = summary.workers.iter().map(|w| w.worker_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "workers should be sorted by id");

    let a = summary
        .workers
        .iter()
        .find(|w| w.worker_id == t.worker)
        .unwrap();
    assert_eq!(a.worker_name, "Dana Fox");
    assert_eq!(a.shift_count, 1);
    assert_eq!(a.completed_count, 1);
    assert_eq!(a.hours_worked, 2.0);
    assert_eq!(a.average_rating, Some(5.0));
    assert_eq!(a.late_count, 0);

    let b = summary
        .workers
        .iter()
        .find(|w| w.worker_id == worker_b)
        .unwrap();
    assert_eq!(b.hours_worked, 3.0);
    assert_eq!(b.average_rating, Some(4.0));

    let c = summary
        .workers
        .iter()
        .find(|w| w.worker_id == worker_c)
        .unwrap();
    assert_eq!(c.shift_count, 1);
    assert_eq!(c.completed_count, 0);
    assert_eq!(c.hours_worked, 0.0);
    assert_eq!(c.average_rating, None);
}

#[tokio::test]
async fn filter_by_worker_narrows_rows_and_shifts() {
    let t = TestEngine::new().await;
    let (shift_a, _, _, _, _) = seed_scenario(&t).await;

    let summary = t
        .engine
        .analytics()
        .provider_shift_analytics(
            t.provider,
            &AnalyticsFilter {
                worker_id: Some(t.worker),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.total_shifts, 1);
    assert_eq!(summary.total_assignments, 1);
    assert_eq!(summary.workers.len(), 1);
    assert_eq!(summary.workers[0].worker_id, t.worker);
    assert_eq!(summary.total_scheduled_hours, shift_a.window().scheduled_hours());
}

#[tokio::test]
async fn filter_by_date_range_is_inclusive_on_start_date() {
    let t = TestEngine::new().await;
    seed_scenario(&t).await;

    let in_range = t
        .engine
        .analytics()
        .provider_shift_analytics(
            t.provider,
            &AnalyticsFilter {
                from: Some(chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()),
                to: Some(chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(in_range.total_shifts, 3);

    let out_of_range = t
        .engine
        .analytics()
        .provider_shift_analytics(
            t.provider,
            &AnalyticsFilter {
                from: Some(chrono::NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(out_of_range.total_shifts, 0);
    assert_eq!(out_of_range.attendance_rate, 0.0);
}

#[tokio::test]
async fn filter_by_job() {
    let t = TestEngine::new().await;
    seed_scenario(&t).await;

    let summary = t
        .engine
        .analytics()
        .provider_shift_analytics(
            t.provider,
            &AnalyticsFilter {
                job_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.total_shifts, 0);
}

#[tokio::test]
async fn unknown_provider_yields_empty_summary() {
    let t = TestEngine::new().await;
    seed_scenario(&t).await;

    let summary = t
        .engine
        .analytics()
        .provider_shift_analytics(Uuid::new_v4(), &AnalyticsFilter::default())
        .await
        .unwrap();
    assert_eq!(summary.total_shifts, 0);
    assert_eq!(summary.total_assignments, 0);
    assert_eq!(summary.attendance_rate, 0.0);
    assert!(summary.workers.is_empty());
}

#[tokio::test]
async fn csv_header_order_is_exact() {
    let t = TestEngine::new().await;
    seed_scenario(&t).await;

    let csv = t
        .engine
        .analytics()
        .export_csv(t.provider, &AnalyticsFilter::default())
        .await
        .unwrap();

    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "Shift ID,Job Title,Worker Name,Start Date,End Date,Start Time,End Time,\
         Status,Check-In Time,Check-Out Time,Hours Worked,Late Check-In,Rating,Feedback"
    );
    // Header plus one row per assignment.
    assert_eq!(csv.lines().count(), 4);
}

#[tokio::test]
async fn csv_rows_flatten_shift_and_assignment() {
    let t = TestEngine::new().await;
    let shift = t.create_default_shift().await;
    t.clock.set(utc(2025, 1, 10, 9, 5));
    t.engine
        .attendance()
        .check_in(shift.id, t.worker, None)
        .await
        .unwrap();
    t.clock.set(utc(2025, 1, 10, 17, 2));
    t.engine
        .attendance()
        .check_out(shift.id, t.worker, None)
        .await
        .unwrap();
    t.engine
        .attendance()
        .add_rating(shift.id, t.worker, t.provider, 4, Some("Solid work".to_string()))
        .await
        .unwrap();

    let csv = t
        .engine
        .analytics()
        .export_csv(t.provider, &AnalyticsFilter::default())
        .await
        .unwrap();
    let row = csv.lines().nth(1).unwrap();

    assert_eq!(
        row,
        "SH-000001,Warehouse Picker,Dana Fox,2025-01-10,2025-01-10,09:00,17:00,\
         COMPLETED,2025-01-10T09:05:00+00:00,2025-01-10T17:02:00+00:00,7.95,false,4,Solid work"
    );
}

#[tokio::test]
async fn csv_blanks_for_unset_fields() {
    let t = TestEngine::new().await;
    t.create_default_shift().await;

    let csv = t
        .engine
        .analytics()
        .export_csv(t.provider, &AnalyticsFilter::default())
        .await
        .unwrap();
    let row = csv.lines().nth(1).unwrap();

    assert!(row.ends_with("SCHEDULED,,,,false,,"));
}
