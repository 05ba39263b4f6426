//! Read-only attendance rollups and CSV export for a provider's shifts.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::{JobRepository, UserDirectory};
use crate::error::{Result, RosterError};
use crate::shift::attendance::round2;
use crate::shift::model::{Shift, ShiftAssignment, ShiftStatus};
use crate::store::ShiftStore;

/// Narrowing filters for analytics queries. The date range is inclusive
/// and applies to the shift's start date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub worker_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub scheduled: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub missed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSummary {
    pub worker_id: Uuid,
    pub worker_name: String,
    pub shift_count: usize,
    pub completed_count: usize,
    pub hours_worked: f64,
    pub average_rating: Option<f64>,
    pub late_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderShiftAnalytics {
    pub total_shifts: usize,
    pub status_counts: StatusCounts,
    pub total_scheduled_hours: f64,
    pub total_worked_hours: f64,
    pub total_assignments: usize,
    pub checked_in_count: usize,
    pub attendance_rate: f64,
    pub late_check_in_count: usize,
    pub workers: Vec<WorkerSummary>,
}

const CSV_HEADER: [&str; 14] = [
    "Shift ID",
    "Job Title",
    "Worker Name",
    "Start Date",
    "End Date",
    "Start Time",
    "End Time",
    "Status",
    "Check-In Time",
    "Check-Out Time",
    "Hours Worked",
    "Late Check-In",
    "Rating",
    "Feedback",
];

#[derive(Default)]
struct WorkerAccumulator {
    shift_count: usize,
    completed_count: usize,
    hours_worked: f64,
    rating_sum: u32,
    rating_count: usize,
    late_count: usize,
}

/// Pure projections over a provider's shifts and assignment rows.
pub struct AnalyticsAggregator {
    store: Arc<ShiftStore>,
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserDirectory>,
}

impl AnalyticsAggregator {
    pub fn new(
        store: Arc<ShiftStore>,
        jobs: Arc<dyn JobRepository>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self { store, jobs, users }
    }

    /// Summary rollup: status counts, scheduled/worked hours, attendance
    /// rate, and a per-worker breakdown sorted by worker id.
    pub async fn provider_shift_analytics(
        &self,
        provider: Uuid,
        filter: &AnalyticsFilter,
    ) -> Result<ProviderShiftAnalytics> {
        let data = self.collect(provider, filter).await;

        let mut summary = ProviderShiftAnalytics {
            total_shifts: data.len(),
            status_counts: StatusCounts::default(),
            total_scheduled_hours: 0.0,
            total_worked_hours: 0.0,
            total_assignments: 0,
            checked_in_count: 0,
            attendance_rate: 0.0,
            late_check_in_count: 0,
            workers: Vec::new(),
        };
        let mut per_worker: BTreeMap<Uuid, WorkerAccumulator> = BTreeMap::new();

        for (shift, rows) in &data {
            match shift.status {
                ShiftStatus::Scheduled => summary.status_counts.scheduled += 1,
                ShiftStatus::InProgress => summary.status_counts.in_progress += 1,
                ShiftStatus::Completed => summary.status_counts.completed += 1,
                ShiftStatus::Missed => summary.status_counts.missed += 1,
                ShiftStatus::Cancelled => summary.status_counts.cancelled += 1,
            }
            summary.total_scheduled_hours += shift.window().scheduled_hours();

            for row in rows {
                summary.total_assignments += 1;
                if row.checked_in() {
                    summary.checked_in_count += 1;
                }
                if row.is_late_check_in {
                    summary.late_check_in_count += 1;
                }
                summary.total_worked_hours += row.hours_worked.unwrap_or(0.0);

                let acc = per_worker.entry(row.worker_id).or_default();
                acc.shift_count += 1;
                if shift.status == ShiftStatus::Completed {
                    acc.completed_count += 1;
                }
                acc.hours_worked += row.hours_worked.unwrap_or(0.0);
                if let Some(rating) = row.rating {
                    acc.rating_sum += rating as u32;
                    acc.rating_count += 1;
                }
                if row.is_late_check_in {
                    acc.late_count += 1;
                }
            }
        }

        summary.total_scheduled_hours = round2(summary.total_scheduled_hours);
        summary.total_worked_hours = round2(summary.total_worked_hours);
        if summary.total_assignments > 0 {
            summary.attendance_rate =
                summary.checked_in_count as f64 / summary.total_assignments as f64;
        }

        for (worker_id, acc) in per_worker {
            let worker_name = self
                .users
                .user(worker_id)
                .await
                .map(|u| u.name)
                .unwrap_or_default();
            summary.workers.push(WorkerSummary {
                worker_id,
                worker_name,
                shift_count: acc.shift_count,
                completed_count: acc.completed_count,
                hours_worked: round2(acc.hours_worked),
                average_rating: (acc.rating_count > 0)
                    .then(|| round2(acc.rating_sum as f64 / acc.rating_count as f64)),
                late_count: acc.late_count,
            });
        }

        Ok(summary)
    }

    /// Flatten the same joined data to one CSV row per assignment, in the
    /// fixed column order consumers of the upstream export expect.
    pub async fn export_csv(&self, provider: Uuid, filter: &AnalyticsFilter) -> Result<String> {
        let data = self.collect(provider, filter).await;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;

        for (shift, rows) in &data {
            let job_title = self
                .jobs
                .job(shift.job_id)
                .await
                .map(|j| j.title)
                .unwrap_or_default();

            for row in rows {
                let worker_name = self
                    .users
                    .user(row.worker_id)
                    .await
                    .map(|u| u.name)
                    .unwrap_or_default();

                writer.write_record([
                    shift.id.to_string(),
                    job_title.clone(),
                    worker_name,
                    shift.start_date.format("%Y-%m-%d").to_string(),
                    shift.end_date.format("%Y-%m-%d").to_string(),
                    shift.start_time.format("%H:%M").to_string(),
                    shift.end_time.format("%H:%M").to_string(),
                    shift.status.to_string(),
                    row.check_in_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
                    row.check_out_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
                    row.hours_worked.map(|h| format!("{h:.2}")).unwrap_or_default(),
                    row.is_late_check_in.to_string(),
                    row.rating.map(|r| r.to_string()).unwrap_or_default(),
                    row.feedback.clone().unwrap_or_default(),
                ])?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| RosterError::Internal(format!("CSV flush failed: {e}")))?;
        String::from_utf8(bytes).map_err(|e| RosterError::Internal(format!("CSV not UTF-8: {e}")))
    }

    async fn collect(
        &self,
        provider: Uuid,
        filter: &AnalyticsFilter,
    ) -> Vec<(Shift, Vec<ShiftAssignment>)> {
        let shifts = self.store.shifts_created_by(provider).await;
        let mut data = Vec::new();

        for shift in shifts {
            if let Some(job_id) = filter.job_id {
                if shift.job_id != job_id {
                    continue;
                }
            }
            if let Some(from) = filter.from {
                if shift.start_date < from {
                    continue;
                }
            }
            if let Some(to) = filter.to {
                if shift.start_date > to {
                    continue;
                }
            }
            if let Some(worker_id) = filter.worker_id {
                if !shift.has_worker(worker_id) {
                    continue;
                }
            }

            let mut rows = self
                .store
                .assignments_for_shift(shift.id)
                .await
                .unwrap_or_default();
            if let Some(worker_id) = filter.worker_id {
                rows.retain(|r| r.worker_id == worker_id);
            }
            data.push((shift, rows));
        }

        data
    }
}
