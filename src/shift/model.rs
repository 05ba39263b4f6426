use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Readable shift id, rendered as `SH-000042` on the wire and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ShiftId(pub u64);

impl std::fmt::Display for ShiftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SH-{:06}", self.0)
    }
}

impl std::str::FromStr for ShiftId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("SH-").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(ShiftId)
            .map_err(|_| format!("invalid shift id: {s}"))
    }
}

impl From<ShiftId> for String {
    fn from(id: ShiftId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ShiftId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Readable assignment id, rendered as `SA-000042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AssignmentId(pub u64);

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SA-{:06}", self.0)
    }
}

impl std::str::FromStr for AssignmentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("SA-").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(AssignmentId)
            .map_err(|_| format!("invalid assignment id: {s}"))
    }
}

impl From<AssignmentId> for String {
    fn from(id: AssignmentId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for AssignmentId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Scheduled,
    InProgress,
    Completed,
    Missed,
    Cancelled,
}

impl ShiftStatus {
    /// Completed, Missed, and Cancelled accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Missed | Self::Cancelled)
    }
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftStatus::Scheduled => write!(f, "SCHEDULED"),
            ShiftStatus::InProgress => write!(f, "IN_PROGRESS"),
            ShiftStatus::Completed => write!(f, "COMPLETED"),
            ShiftStatus::Missed => write!(f, "MISSED"),
            ShiftStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Latitude/longitude reported with a check-in or check-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// The calendar window a shift occupies. Wall-clock times are interpreted
/// as UTC when combined into instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl ShiftWindow {
    /// Absolute instant the shift begins.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start_date.and_time(self.start_time).and_utc()
    }

    /// Absolute instant the shift ends.
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.end_date.and_time(self.end_time).and_utc()
    }

    /// Scheduled length in hours.
    pub fn scheduled_hours(&self) -> f64 {
        (self.end_instant() - self.start_instant()).num_minutes() as f64 / 60.0
    }
}

/// A scheduled work block tied to a job posting and an accepted application.
///
/// `assigned_workers` is a denormalized view over the shift's assignment
/// rows; the store keeps the two in lockstep under one lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub job_id: Uuid,
    pub application_id: Uuid,
    pub created_by: Uuid,
    pub assigned_workers: Vec<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ShiftStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub break_minutes: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ShiftId,
        job_id: Uuid,
        application_id: Uuid,
        created_by: Uuid,
        worker_id: Uuid,
        window: ShiftWindow,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            job_id,
            application_id,
            created_by,
            assigned_workers: vec![worker_id],
            start_date: window.start_date,
            end_date: window.end_date,
            start_time: window.start_time,
            end_time: window.end_time,
            status: ShiftStatus::Scheduled,
            location: None,
            notes: None,
            break_minutes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn window(&self) -> ShiftWindow {
        ShiftWindow {
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn start_instant(&self) -> DateTime<Utc> {
        self.window().start_instant()
    }

    pub fn end_instant(&self) -> DateTime<Utc> {
        self.window().end_instant()
    }

    pub fn has_worker(&self, worker_id: Uuid) -> bool {
        self.assigned_workers.contains(&worker_id)
    }
}

/// One worker's attendance record for one shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAssignment {
    pub id: AssignmentId,
    pub shift_id: ShiftId,
    pub worker_id: Uuid,
    pub assigned_by: Uuid,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,
    pub is_late_check_in: bool,
    pub hours_worked: Option<f64>,
    pub rating: Option<u8>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShiftAssignment {
    pub fn new(
        id: AssignmentId,
        shift_id: ShiftId,
        worker_id: Uuid,
        assigned_by: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            shift_id,
            worker_id,
            assigned_by,
            check_in_time: None,
            check_out_time: None,
            check_in_lat: None,
            check_in_lng: None,
            check_out_lat: None,
            check_out_lng: None,
            is_late_check_in: false,
            hours_worked: None,
            rating: None,
            feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn checked_in(&self) -> bool {
        self.check_in_time.is_some()
    }

    pub fn checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }
}
