use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, RosterError};
use crate::sequence::{EntityKind, SequenceSource};
use crate::shift::lifecycle::{self, AttendanceSnapshot, ShiftEvent};
use crate::shift::model::{AssignmentId, Shift, ShiftAssignment, ShiftId, ShiftStatus};

/// In-memory persistence for shifts and their assignment rows.
///
/// A shift plus its rows form one consistency unit: every compound
/// mutation runs inside a single write-lock critical section, so the
/// denormalized `assigned_workers` set can never drift from the rows.
/// [`ShiftStore::apply_event`] is the conditional write that keeps
/// concurrent status transitions exactly-once.
#[derive(Debug, Default)]
pub struct ShiftStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    shifts: HashMap<ShiftId, Shift>,
    assignments: HashMap<AssignmentId, ShiftAssignment>,
    // (shift, worker) -> row, enforcing one row per pair
    by_worker: HashMap<(ShiftId, Uuid), AssignmentId>,
}

impl StoreInner {
    fn attendance(&self, shift_id: ShiftId) -> AttendanceSnapshot {
        let mut att = AttendanceSnapshot::default();
        for row in self.assignments.values().filter(|a| a.shift_id == shift_id) {
            att.assigned += 1;
            if row.checked_in() {
                att.checked_in += 1;
            }
            if row.checked_out() {
                att.checked_out += 1;
            }
        }
        att
    }

    fn rows_for_shift(&self, shift_id: ShiftId) -> Vec<ShiftAssignment> {
        let mut rows: Vec<ShiftAssignment> = self
            .assignments
            .values()
            .filter(|a| a.shift_id == shift_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        rows
    }

    fn delete_rows_for_shift(&mut self, shift_id: ShiftId) {
        self.assignments.retain(|_, a| a.shift_id != shift_id);
        self.by_worker.retain(|(sid, _), _| *sid != shift_id);
    }
}

/// Whether `create_or_merge` inserted a new shift or merged the worker
/// into an existing one with the same application and window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Merged,
}

impl ShiftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new shift with its first assignment row, unless a shift for
    /// the same application and identical window already exists; then the
    /// worker is merged into the existing shift instead. Fails with
    /// `Conflict` if the worker already holds a row on the existing shift.
    pub async fn create_or_merge(
        &self,
        shift: Shift,
        mut row: ShiftAssignment,
        now: DateTime<Utc>,
    ) -> Result<(Shift, CreateOutcome)> {
        let mut inner = self.inner.write().await;

        // Terminal shifts are absorbing; a re-post of the same slot gets a
        // fresh shift instead of resurrecting a cancelled or missed one.
        let existing = inner
            .shifts
            .values()
            .find(|s| {
                s.application_id == shift.application_id
                    && !s.status.is_terminal()
                    && s.window() == shift.window()
            })
            .map(|s| s.id);

        match existing {
            Some(shift_id) => {
                let worker_id = row.worker_id;
                if inner.by_worker.contains_key(&(shift_id, worker_id)) {
                    return Err(RosterError::WorkerAlreadyAssigned { shift_id, worker_id });
                }
                row.shift_id = shift_id;
                inner.by_worker.insert((shift_id, worker_id), row.id);
                inner.assignments.insert(row.id, row);
                let merged = inner
                    .shifts
                    .get_mut(&shift_id)
                    .ok_or(RosterError::ShiftNotFound(shift_id))?;
                merged.assigned_workers.push(worker_id);
                merged.updated_at = now;
                Ok((merged.clone(), CreateOutcome::Merged))
            }
            None => {
                inner.by_worker.insert((shift.id, row.worker_id), row.id);
                inner.assignments.insert(row.id, row);
                inner.shifts.insert(shift.id, shift.clone());
                Ok((shift, CreateOutcome::Created))
            }
        }
    }

    pub async fn shift(&self, shift_id: ShiftId) -> Result<Shift> {
        let inner = self.inner.read().await;
        inner
            .shifts
            .get(&shift_id)
            .cloned()
            .ok_or(RosterError::ShiftNotFound(shift_id))
    }

    pub async fn list_shifts(&self) -> Vec<Shift> {
        let inner = self.inner.read().await;
        let mut shifts: Vec<Shift> = inner.shifts.values().cloned().collect();
        shifts.sort_by_key(|s| s.id);
        shifts
    }

    pub async fn shifts_created_by(&self, provider: Uuid) -> Vec<Shift> {
        let inner = self.inner.read().await;
        let mut shifts: Vec<Shift> = inner
            .shifts
            .values()
            .filter(|s| s.created_by == provider)
            .cloned()
            .collect();
        shifts.sort_by_key(|s| s.id);
        shifts
    }

    pub async fn shifts_for_worker(&self, worker_id: Uuid) -> Vec<Shift> {
        let inner = self.inner.read().await;
        let mut shifts: Vec<Shift> = inner
            .shifts
            .values()
            .filter(|s| s.has_worker(worker_id))
            .cloned()
            .collect();
        shifts.sort_by_key(|s| s.id);
        shifts
    }

    /// Delete the shift and all of its rows.
    pub async fn remove_shift(&self, shift_id: ShiftId) -> Result<Shift> {
        let mut inner = self.inner.write().await;
        let shift = inner
            .shifts
            .remove(&shift_id)
            .ok_or(RosterError::ShiftNotFound(shift_id))?;
        inner.delete_rows_for_shift(shift_id);
        Ok(shift)
    }

    pub async fn assignment(&self, shift_id: ShiftId, worker_id: Uuid) -> Result<ShiftAssignment> {
        let inner = self.inner.read().await;
        if !inner.shifts.contains_key(&shift_id) {
            return Err(RosterError::ShiftNotFound(shift_id));
        }
        inner
            .by_worker
            .get(&(shift_id, worker_id))
            .and_then(|id| inner.assignments.get(id))
            .cloned()
            .ok_or(RosterError::AssignmentNotFound { shift_id, worker_id })
    }

    pub async fn assignments_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftAssignment>> {
        let inner = self.inner.read().await;
        if !inner.shifts.contains_key(&shift_id) {
            return Err(RosterError::ShiftNotFound(shift_id));
        }
        Ok(inner.rows_for_shift(shift_id))
    }

    /// Union `worker_ids` into the shift's assigned set, creating rows only
    /// for workers not already present. Returns the updated shift and the
    /// ids that were genuinely added; re-invoking with present ids is a
    /// no-op, not an error.
    pub async fn add_workers(
        &self,
        shift_id: ShiftId,
        assigned_by: Uuid,
        worker_ids: &[Uuid],
        now: DateTime<Utc>,
        sequences: &dyn SequenceSource,
    ) -> Result<(Shift, Vec<Uuid>)> {
        let mut inner = self.inner.write().await;
        let status = inner
            .shifts
            .get(&shift_id)
            .ok_or(RosterError::ShiftNotFound(shift_id))?
            .status;
        if status.is_terminal() {
            return Err(RosterError::ShiftClosed { shift_id, status });
        }

        let mut added = Vec::new();
        for &worker_id in worker_ids {
            if inner.by_worker.contains_key(&(shift_id, worker_id)) || added.contains(&worker_id) {
                continue;
            }
            let row_id = AssignmentId(sequences.next(EntityKind::Assignment));
            let row = ShiftAssignment::new(row_id, shift_id, worker_id, assigned_by, now);
            inner.by_worker.insert((shift_id, worker_id), row_id);
            inner.assignments.insert(row_id, row);
            added.push(worker_id);
        }

        let shift = inner
            .shifts
            .get_mut(&shift_id)
            .ok_or(RosterError::ShiftNotFound(shift_id))?;
        if !added.is_empty() {
            shift.assigned_workers.extend(added.iter().copied());
            shift.updated_at = now;
        }
        Ok((shift.clone(), added))
    }

    /// Remove the workers from the shift and delete their rows together.
    /// A worker who has already checked in cannot be removed; nothing is
    /// mutated when any target row fails that guard. Workers with no row
    /// on the shift are skipped.
    pub async fn remove_workers(
        &self,
        shift_id: ShiftId,
        worker_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Shift> {
        let mut inner = self.inner.write().await;
        if !inner.shifts.contains_key(&shift_id) {
            return Err(RosterError::ShiftNotFound(shift_id));
        }

        for &worker_id in worker_ids {
            if let Some(row_id) = inner.by_worker.get(&(shift_id, worker_id)) {
                if inner.assignments.get(row_id).is_some_and(|r| r.checked_in()) {
                    return Err(RosterError::WorkerHasAttendance { shift_id, worker_id });
                }
            }
        }

        for &worker_id in worker_ids {
            if let Some(row_id) = inner.by_worker.remove(&(shift_id, worker_id)) {
                inner.assignments.remove(&row_id);
            }
        }

        let shift = inner
            .shifts
            .get_mut(&shift_id)
            .ok_or(RosterError::ShiftNotFound(shift_id))?;
        shift.assigned_workers.retain(|w| !worker_ids.contains(w));
        shift.updated_at = now;
        Ok(shift.clone())
    }

    /// Apply a closure to one assignment row inside the write lock; the
    /// shift's current state is visible to the closure for precondition
    /// checks. Nothing is persisted when the closure fails.
    pub async fn update_assignment_with<F>(
        &self,
        shift_id: ShiftId,
        worker_id: Uuid,
        now: DateTime<Utc>,
        f: F,
    ) -> Result<ShiftAssignment>
    where
        F: FnOnce(&Shift, &mut ShiftAssignment) -> Result<()>,
    {
        let mut inner = self.inner.write().await;
        let shift = inner
            .shifts
            .get(&shift_id)
            .cloned()
            .ok_or(RosterError::ShiftNotFound(shift_id))?;
        let row_id = *inner
            .by_worker
            .get(&(shift_id, worker_id))
            .ok_or(RosterError::AssignmentNotFound { shift_id, worker_id })?;

        let mut row = inner
            .assignments
            .get(&row_id)
            .cloned()
            .ok_or(RosterError::AssignmentNotFound { shift_id, worker_id })?;
        f(&shift, &mut row)?;
        row.updated_at = now;
        inner.assignments.insert(row_id, row.clone());
        Ok(row)
    }

    /// Conditionally transition the shift's status for the given event.
    ///
    /// The attendance snapshot is recomputed from the live rows and
    /// [`lifecycle::next`] is consulted inside the write lock, so of N
    /// concurrent callers racing toward the same transition exactly one
    /// sees `Ok(Some(new_status))`; the rest see `Ok(None)`.
    pub async fn apply_event(
        &self,
        shift_id: ShiftId,
        event: ShiftEvent,
        now: DateTime<Utc>,
    ) -> Result<Option<ShiftStatus>> {
        let mut inner = self.inner.write().await;
        let att = inner.attendance(shift_id);
        let shift = inner
            .shifts
            .get_mut(&shift_id)
            .ok_or(RosterError::ShiftNotFound(shift_id))?;
        match lifecycle::next(shift.status, event, &att) {
            Some(status) => {
                shift.status = status;
                shift.updated_at = now;
                Ok(Some(status))
            }
            None => Ok(None),
        }
    }

    /// Provider-initiated cancellation: valid only from Scheduled. Clears
    /// the assigned set and deletes the rows in the same critical section,
    /// returning the workers that were removed.
    pub async fn cancel_shift(
        &self,
        shift_id: ShiftId,
        now: DateTime<Utc>,
    ) -> Result<(Shift, Vec<Uuid>)> {
        let mut inner = self.inner.write().await;
        let att = inner.attendance(shift_id);
        let status = inner
            .shifts
            .get(&shift_id)
            .ok_or(RosterError::ShiftNotFound(shift_id))?
            .status;

        match lifecycle::next(status, ShiftEvent::ProviderCancelled, &att) {
            Some(next_status) => {
                inner.delete_rows_for_shift(shift_id);
                let shift = inner
                    .shifts
                    .get_mut(&shift_id)
                    .ok_or(RosterError::ShiftNotFound(shift_id))?;
                let removed = std::mem::take(&mut shift.assigned_workers);
                shift.status = next_status;
                shift.updated_at = now;
                Ok((shift.clone(), removed))
            }
            None => Err(RosterError::CancelNotAllowed { shift_id, status }),
        }
    }

    /// Scheduled shifts whose start instant is older than `cutoff`. The
    /// zero-check-in condition is re-verified by `apply_event` at write
    /// time, so this list may safely go stale.
    pub async fn sweep_candidates(&self, cutoff: DateTime<Utc>) -> Vec<ShiftId> {
        let inner = self.inner.read().await;
        let mut ids: Vec<ShiftId> = inner
            .shifts
            .values()
            .filter(|s| s.status == ShiftStatus::Scheduled && s.start_instant() < cutoff)
            .map(|s| s.id)
            .collect();
        ids.sort();
        ids
    }

    pub async fn shift_count(&self) -> usize {
        self.inner.read().await.shifts.len()
    }

    pub async fn assignment_count(&self) -> usize {
        self.inner.read().await.assignments.len()
    }
}
