//! Canonical shift status transitions.
//!
//! Every status change in the engine routes through [`next`] so the rules
//! live in exactly one place and are testable without storage. Callers
//! apply the result under the store's write lock (see
//! [`crate::store::ShiftStore::apply_event`]).

use crate::shift::model::ShiftStatus;

/// An attendance-affecting event reported by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftEvent {
    /// A worker recorded a check-in.
    CheckInRecorded,
    /// A worker recorded a check-out.
    CheckOutRecorded,
    /// The sweeper found the shift past its no-show cutoff.
    SweepDeadlinePassed,
    /// Workers were unassigned or cancelled their assignment.
    WorkersRemoved,
    /// The shift creator cancelled the whole shift.
    ProviderCancelled,
}

/// Live attendance counts for a shift, computed from its assignment rows
/// at the moment the transition is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceSnapshot {
    pub assigned: usize,
    pub checked_in: usize,
    pub checked_out: usize,
}

/// Returns the status the shift moves to, or `None` when the event fires
/// no transition from the current status.
///
/// Completed, Missed, and Cancelled are absorbing: every event returns
/// `None`, which keeps status monotonic for all callers.
pub fn next(
    current: ShiftStatus,
    event: ShiftEvent,
    att: &AttendanceSnapshot,
) -> Option<ShiftStatus> {
    use ShiftEvent::*;
    use ShiftStatus::*;

    match (current, event) {
        (Scheduled, CheckInRecorded) if att.checked_in >= 1 => Some(InProgress),
        (InProgress, CheckOutRecorded) if att.assigned > 0 && att.checked_out == att.assigned => {
            Some(Completed)
        }
        (Scheduled, SweepDeadlinePassed) if att.checked_in == 0 => Some(Missed),
        (Scheduled, ProviderCancelled) => Some(Cancelled),
        // Removing a no-show worker can leave every remaining assignment
        // checked out, which completes the shift.
        (InProgress, WorkersRemoved) if att.assigned > 0 && att.checked_out == att.assigned => {
            Some(Completed)
        }
        (InProgress, WorkersRemoved) if att.assigned == 0 => Some(Scheduled),
        _ => None,
    }
}
