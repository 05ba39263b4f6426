use thiserror::Error;
use uuid::Uuid;

use crate::shift::model::{ShiftId, ShiftStatus};

/// Stable failure taxonomy surfaced by every public operation.
///
/// Transport layers map kinds to status codes without matching on
/// individual [`RosterError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Forbidden,
    Internal,
}

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Shift not found: {0}")]
    ShiftNotFound(ShiftId),

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Application not found: {0}")]
    ApplicationNotFound(Uuid),

    #[error("Application {application_id} does not belong to job {job_id}")]
    ApplicationJobMismatch { application_id: Uuid, job_id: Uuid },

    #[error("Worker {worker_id} is not assigned to shift {shift_id}")]
    AssignmentNotFound { shift_id: ShiftId, worker_id: Uuid },

    #[error("Worker {worker_id} is already assigned to shift {shift_id}")]
    WorkerAlreadyAssigned { shift_id: ShiftId, worker_id: Uuid },

    #[error("Worker {worker_id} has already checked in to shift {shift_id}")]
    AlreadyCheckedIn { shift_id: ShiftId, worker_id: Uuid },

    #[error("Worker {worker_id} has already checked out of shift {shift_id}")]
    AlreadyCheckedOut { shift_id: ShiftId, worker_id: Uuid },

    #[error("Worker {worker_id} must check in to shift {shift_id} before checking out")]
    MustCheckInFirst { shift_id: ShiftId, worker_id: Uuid },

    #[error("Check-out for worker {worker_id} on shift {shift_id} must be after the check-in")]
    CheckOutNotAfterCheckIn { shift_id: ShiftId, worker_id: Uuid },

    #[error("Shift {shift_id} is {status} and can no longer be modified")]
    ShiftClosed { shift_id: ShiftId, status: ShiftStatus },

    #[error("Shift {0} has already started")]
    ShiftAlreadyStarted(ShiftId),

    #[error("Worker {worker_id} has checked in and cannot be removed from shift {shift_id}")]
    WorkerHasAttendance { shift_id: ShiftId, worker_id: Uuid },

    #[error("Shift {shift_id} is {status} and cannot be cancelled")]
    CancelNotAllowed { shift_id: ShiftId, status: ShiftStatus },

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Only the shift creator may perform this action on shift {0}")]
    NotShiftCreator(ShiftId),

    #[error("Actor may not act on behalf of worker {worker_id} for shift {shift_id}")]
    NotActingWorker { shift_id: ShiftId, worker_id: Uuid },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RosterError {
    /// The stable kind for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ShiftNotFound(_)
            | Self::JobNotFound(_)
            | Self::ApplicationNotFound(_)
            | Self::ApplicationJobMismatch { .. }
            | Self::AssignmentNotFound { .. } => ErrorKind::NotFound,

            Self::WorkerAlreadyAssigned { .. }
            | Self::AlreadyCheckedIn { .. }
            | Self::AlreadyCheckedOut { .. } => ErrorKind::Conflict,

            Self::MustCheckInFirst { .. }
            | Self::CheckOutNotAfterCheckIn { .. }
            | Self::ShiftClosed { .. }
            | Self::ShiftAlreadyStarted(_)
            | Self::WorkerHasAttendance { .. }
            | Self::CancelNotAllowed { .. }
            | Self::InvalidRating(_) => ErrorKind::InvalidState,

            Self::NotShiftCreator(_) | Self::NotActingWorker { .. } => ErrorKind::Forbidden,

            Self::Csv(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
