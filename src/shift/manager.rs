use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::clock::Clock;
use crate::directory::{JobRepository, UserDirectory};
use crate::error::{Result, RosterError};
use crate::notify::{MailGateway, NotificationGateway, NotificationType};
use crate::sequence::{EntityKind, SequenceSource};
use crate::shift::lifecycle::ShiftEvent;
use crate::shift::model::{AssignmentId, Shift, ShiftAssignment, ShiftId, ShiftWindow};
use crate::store::{CreateOutcome, ShiftStore};

/// Input for [`ShiftLifecycleManager::create_shift`].
#[derive(Debug, Clone)]
pub struct CreateShiftParams {
    pub job_id: Uuid,
    pub application_id: Uuid,
    pub worker_id: Uuid,
    pub creator: Uuid,
    pub window: ShiftWindow,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub break_minutes: Option<u32>,
}

/// Creates shifts and manages who is assigned to them.
///
/// Every status change triggered here routes through the store's
/// conditional [`ShiftStore::apply_event`], never a direct write.
pub struct ShiftLifecycleManager {
    store: Arc<ShiftStore>,
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn NotificationGateway>,
    mailer: Arc<dyn MailGateway>,
    clock: Arc<dyn Clock>,
    sequences: Arc<dyn SequenceSource>,
}

impl ShiftLifecycleManager {
    pub fn new(
        store: Arc<ShiftStore>,
        jobs: Arc<dyn JobRepository>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn NotificationGateway>,
        mailer: Arc<dyn MailGateway>,
        clock: Arc<dyn Clock>,
        sequences: Arc<dyn SequenceSource>,
    ) -> Self {
        Self {
            store,
            jobs,
            users,
            notifier,
            mailer,
            clock,
            sequences,
        }
    }

    /// Create a shift for a job/application pair, or merge the worker into
    /// an existing shift with the same application and window.
    pub async fn create_shift(&self, params: CreateShiftParams) -> Result<Shift> {
        self.jobs
            .job(params.job_id)
            .await
            .ok_or(RosterError::JobNotFound(params.job_id))?;
        let application = self
            .jobs
            .application(params.application_id)
            .await
            .ok_or(RosterError::ApplicationNotFound(params.application_id))?;
        if application.job_id != params.job_id {
            return Err(RosterError::ApplicationJobMismatch {
                application_id: params.application_id,
                job_id: params.job_id,
            });
        }

        let now = self.clock.now();
        let shift_id = ShiftId(self.sequences.next(EntityKind::Shift));
        let row_id = AssignmentId(self.sequences.next(EntityKind::Assignment));

        let mut shift = Shift::new(
            shift_id,
            params.job_id,
            params.application_id,
            params.creator,
            params.worker_id,
            params.window,
            now,
        );
        shift.location = params.location;
        shift.notes = params.notes;
        shift.break_minutes = params.break_minutes;
        let row = ShiftAssignment::new(row_id, shift_id, params.worker_id, params.creator, now);

        let (shift, outcome) = self.store.create_or_merge(shift, row, now).await?;
        match outcome {
            CreateOutcome::Created => {
                tracing::info!(
                    shift_id = %shift.id,
                    job_id = %params.job_id,
                    worker_id = %params.worker_id,
                    start = %shift.start_instant(),
                    "Shift created"
                );
            }
            CreateOutcome::Merged => {
                tracing::info!(
                    shift_id = %shift.id,
                    worker_id = %params.worker_id,
                    "Worker merged into existing shift with matching window"
                );
            }
        }

        self.send_assignment_notices(&shift, &[params.worker_id]).await;
        Ok(shift)
    }

    /// Union the workers into the shift's assigned set. Already-present ids
    /// are skipped; only genuinely new workers get rows and notifications.
    pub async fn assign_workers(
        &self,
        shift_id: ShiftId,
        assigned_by: Uuid,
        worker_ids: &[Uuid],
    ) -> Result<Shift> {
        let now = self.clock.now();
        let (shift, added) = self
            .store
            .add_workers(shift_id, assigned_by, worker_ids, now, self.sequences.as_ref())
            .await?;

        if !added.is_empty() {
            tracing::info!(shift_id = %shift_id, added = added.len(), "Workers assigned to shift");
            self.send_assignment_notices(&shift, &added).await;
        }
        Ok(shift)
    }

    /// Remove workers and their rows together. Workers who have checked in
    /// cannot be removed.
    pub async fn unassign_workers(&self, shift_id: ShiftId, worker_ids: &[Uuid]) -> Result<Shift> {
        let now = self.clock.now();
        let shift = self.store.remove_workers(shift_id, worker_ids, now).await?;
        tracing::info!(shift_id = %shift_id, removed = worker_ids.len(), "Workers unassigned from shift");

        if let Some(status) = self
            .store
            .apply_event(shift_id, ShiftEvent::WorkersRemoved, now)
            .await?
        {
            tracing::info!(shift_id = %shift_id, status = %status, "Shift status updated after unassignment");
            return self.store.shift(shift_id).await;
        }
        Ok(shift)
    }

    /// A worker backs out of their own assignment. Allowed only before the
    /// shift's start instant and only while they have not checked in. An
    /// emptied shift stays Scheduled as an open, unfilled slot.
    pub async fn cancel_by_worker(&self, shift_id: ShiftId, worker_id: Uuid) -> Result<Shift> {
        let now = self.clock.now();
        let shift = self.store.shift(shift_id).await?;
        if !shift.has_worker(worker_id) {
            return Err(RosterError::AssignmentNotFound { shift_id, worker_id });
        }
        if now >= shift.start_instant() {
            return Err(RosterError::ShiftAlreadyStarted(shift_id));
        }

        let updated = self.store.remove_workers(shift_id, &[worker_id], now).await?;
        tracing::info!(shift_id = %shift_id, worker_id = %worker_id, "Worker cancelled their assignment");

        if let Err(e) = self
            .notifier
            .notify(
                updated.created_by,
                NotificationType::WorkerCancelled,
                json!({ "shiftId": shift_id, "workerId": worker_id }),
            )
            .await
        {
            tracing::warn!(shift_id = %shift_id, error = %e, "Failed to notify creator of worker cancellation");
        }

        if self
            .store
            .apply_event(shift_id, ShiftEvent::WorkersRemoved, now)
            .await?
            .is_some()
        {
            return self.store.shift(shift_id).await;
        }
        Ok(updated)
    }

    /// Provider-initiated cancellation of the whole shift. Valid only from
    /// Scheduled; the previously assigned workers are notified.
    pub async fn cancel_shift(&self, shift_id: ShiftId) -> Result<Shift> {
        let now = self.clock.now();
        let (shift, removed) = self.store.cancel_shift(shift_id, now).await?;
        tracing::info!(shift_id = %shift_id, workers = removed.len(), "Shift cancelled by provider");

        for worker_id in removed {
            if let Err(e) = self
                .notifier
                .notify(
                    worker_id,
                    NotificationType::ShiftCancelled,
                    json!({ "shiftId": shift_id, "startDate": shift.start_date }),
                )
                .await
            {
                tracing::warn!(shift_id = %shift_id, worker_id = %worker_id, error = %e, "Failed to send cancellation notification");
            }
        }
        Ok(shift)
    }

    /// Explicit hard removal of a shift and all of its rows.
    pub async fn remove_shift(&self, shift_id: ShiftId) -> Result<()> {
        self.store.remove_shift(shift_id).await?;
        tracing::info!(shift_id = %shift_id, "Shift removed");
        Ok(())
    }

    pub async fn shift(&self, shift_id: ShiftId) -> Result<Shift> {
        self.store.shift(shift_id).await
    }

    pub async fn shifts(&self) -> Vec<Shift> {
        self.store.list_shifts().await
    }

    pub async fn shifts_for_provider(&self, provider: Uuid) -> Vec<Shift> {
        self.store.shifts_created_by(provider).await
    }

    pub async fn shifts_for_worker(&self, worker_id: Uuid) -> Vec<Shift> {
        self.store.shifts_for_worker(worker_id).await
    }

    async fn send_assignment_notices(&self, shift: &Shift, worker_ids: &[Uuid]) {
        for &worker_id in worker_ids {
            if let Err(e) = self
                .notifier
                .notify(
                    worker_id,
                    NotificationType::ShiftAssigned,
                    json!({
                        "shiftId": shift.id,
                        "jobId": shift.job_id,
                        "startDate": shift.start_date,
                        "startTime": shift.start_time.format("%H:%M").to_string(),
                    }),
                )
                .await
            {
                tracing::warn!(shift_id = %shift.id, worker_id = %worker_id, error = %e, "Failed to send assignment notification");
            }

            match self.users.user(worker_id).await {
                Some(user) => {
                    if let Err(e) = self
                        .mailer
                        .send_shift_assigned_email(&user.email, &user.name, shift)
                        .await
                    {
                        tracing::warn!(shift_id = %shift.id, worker_id = %worker_id, error = %e, "Failed to send assignment email");
                    }
                }
                None => {
                    tracing::warn!(worker_id = %worker_id, "Worker has no directory entry, skipping assignment email");
                }
            }
        }
    }
}
