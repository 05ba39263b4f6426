use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{Result, RosterError};
use crate::notify::{NotificationGateway, NotificationType};
use crate::shift::lifecycle::ShiftEvent;
use crate::shift::model::{GeoPoint, Shift, ShiftAssignment, ShiftId};
use crate::store::ShiftStore;

/// Records worker attendance against assignment rows.
///
/// Check-ins and check-outs feed the store's conditional transitions, so
/// of N workers racing to start a shift exactly one caller triggers the
/// Scheduled -> InProgress flip and its notification.
pub struct AssignmentTracker {
    store: Arc<ShiftStore>,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

pub(crate) fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

impl AssignmentTracker {
    pub fn new(
        store: Arc<ShiftStore>,
        notifier: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
        }
    }

    /// Record a check-in. A check-in after the shift start plus the
    /// configured grace is flagged late; exactly on the boundary is not.
    pub async fn check_in(
        &self,
        shift_id: ShiftId,
        worker_id: Uuid,
        geo: Option<GeoPoint>,
    ) -> Result<ShiftAssignment> {
        let now = self.clock.now();
        let grace = self.config.late_grace();

        let row = self
            .store
            .update_assignment_with(shift_id, worker_id, now, |shift, row| {
                if shift.status.is_terminal() {
                    return Err(RosterError::ShiftClosed {
                        shift_id,
                        status: shift.status,
                    });
                }
                if row.checked_in() {
                    return Err(RosterError::AlreadyCheckedIn { shift_id, worker_id });
                }
                row.check_in_time = Some(now);
                row.is_late_check_in = now > shift.start_instant() + grace;
                if let Some(geo) = geo {
                    row.check_in_lat = Some(geo.lat);
                    row.check_in_lng = Some(geo.lng);
                }
                Ok(())
            })
            .await?;

        tracing::info!(
            shift_id = %shift_id,
            worker_id = %worker_id,
            late = row.is_late_check_in,
            "Worker checked in"
        );

        let shift = self.store.shift(shift_id).await?;
        self.notify_creator(
            &shift,
            NotificationType::WorkerCheckedIn,
            json!({ "shiftId": shift_id, "workerId": worker_id, "late": row.is_late_check_in }),
        )
        .await;

        if let Some(status) = self
            .store
            .apply_event(shift_id, ShiftEvent::CheckInRecorded, now)
            .await?
        {
            tracing::info!(shift_id = %shift_id, status = %status, "Shift started");
            self.notify_creator(
                &shift,
                NotificationType::ShiftStarted,
                json!({ "shiftId": shift_id }),
            )
            .await;
        }

        Ok(row)
    }

    /// Record a check-out and compute the hours worked for the row. The
    /// check-out instant must be strictly after the check-in.
    pub async fn check_out(
        &self,
        shift_id: ShiftId,
        worker_id: Uuid,
        geo: Option<GeoPoint>,
    ) -> Result<ShiftAssignment> {
        let now = self.clock.now();

        let row = self
            .store
            .update_assignment_with(shift_id, worker_id, now, |_, row| {
                let check_in = row
                    .check_in_time
                    .ok_or(RosterError::MustCheckInFirst { shift_id, worker_id })?;
                if row.checked_out() {
                    return Err(RosterError::AlreadyCheckedOut { shift_id, worker_id });
                }
                if now <= check_in {
                    return Err(RosterError::CheckOutNotAfterCheckIn { shift_id, worker_id });
                }
                row.check_out_time = Some(now);
                let ms = (now - check_in).num_milliseconds();
                row.hours_worked = Some(round2(ms as f64 / 3_600_000.0));
                if let Some(geo) = geo {
                    row.check_out_lat = Some(geo.lat);
                    row.check_out_lng = Some(geo.lng);
                }
                Ok(())
            })
            .await?;

        tracing::info!(
            shift_id = %shift_id,
            worker_id = %worker_id,
            hours = row.hours_worked,
            "Worker checked out"
        );

        if let Some(status) = self
            .store
            .apply_event(shift_id, ShiftEvent::CheckOutRecorded, now)
            .await?
        {
            tracing::info!(shift_id = %shift_id, status = %status, "Shift completed");
            let shift = self.store.shift(shift_id).await?;
            self.notify_creator(
                &shift,
                NotificationType::ShiftCompleted,
                json!({ "shiftId": shift_id }),
            )
            .await;
        }

        Ok(row)
    }

    /// Record the creator's rating for a worker's assignment.
    /// Last write wins; no history is kept.
    pub async fn add_rating(
        &self,
        shift_id: ShiftId,
        worker_id: Uuid,
        rater: Uuid,
        rating: u8,
        feedback: Option<String>,
    ) -> Result<ShiftAssignment> {
        if !(1..=5).contains(&rating) {
            return Err(RosterError::InvalidRating(rating));
        }

        let now = self.clock.now();
        let row = self
            .store
            .update_assignment_with(shift_id, worker_id, now, |shift, row| {
                if shift.created_by != rater {
                    return Err(RosterError::NotShiftCreator(shift_id));
                }
                row.rating = Some(rating);
                row.feedback = feedback;
                Ok(())
            })
            .await?;

        tracing::info!(shift_id = %shift_id, worker_id = %worker_id, rating, "Rating recorded");
        Ok(row)
    }

    pub async fn assignment(&self, shift_id: ShiftId, worker_id: Uuid) -> Result<ShiftAssignment> {
        self.store.assignment(shift_id, worker_id).await
    }

    pub async fn assignments_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftAssignment>> {
        self.store.assignments_for_shift(shift_id).await
    }

    async fn notify_creator(&self, shift: &Shift, kind: NotificationType, payload: serde_json::Value) {
        if let Err(e) = self.notifier.notify(shift.created_by, kind, payload).await {
            tracing::warn!(shift_id = %shift.id, kind = %kind, error = %e, "Failed to notify shift creator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn round2_half_hours() {
        assert_eq!(round2(5_400_000.0 / 3_600_000.0), 1.5);
    }

    #[test]
    fn round2_truncates_to_cents() {
        assert_eq!(round2(7.949999), 7.95);
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(0.005), 0.01);
    }
}
