//! Shift domain: data model, status transitions, lifecycle, attendance.

pub mod attendance;
pub mod lifecycle;
pub mod manager;
pub mod model;

pub use attendance::AssignmentTracker;
pub use lifecycle::{AttendanceSnapshot, ShiftEvent};
pub use manager::{CreateShiftParams, ShiftLifecycleManager};
pub use model::{
    AssignmentId, GeoPoint, Shift, ShiftAssignment, ShiftId, ShiftStatus, ShiftWindow,
};
