//! Outbound notification and mail gateways.
//!
//! Delivery is fire-and-forget: callers log gateway failures and never
//! fail the primary operation on them.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::shift::model::Shift;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ShiftAssigned,
    WorkerCheckedIn,
    ShiftStarted,
    ShiftCompleted,
    ShiftCancelled,
    WorkerCancelled,
    ShiftMissed,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::ShiftAssigned => "SHIFT_ASSIGNED",
            NotificationType::WorkerCheckedIn => "WORKER_CHECKED_IN",
            NotificationType::ShiftStarted => "SHIFT_STARTED",
            NotificationType::ShiftCompleted => "SHIFT_COMPLETED",
            NotificationType::ShiftCancelled => "SHIFT_CANCELLED",
            NotificationType::WorkerCancelled => "WORKER_CANCELLED",
            NotificationType::ShiftMissed => "SHIFT_MISSED",
        };
        write!(f, "{s}")
    }
}

#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn notify(&self, user_id: Uuid, kind: NotificationType, payload: Value) -> Result<()>;
}

#[async_trait]
pub trait MailGateway: Send + Sync {
    async fn send_shift_assigned_email(
        &self,
        recipient: &str,
        worker_name: &str,
        shift: &Shift,
    ) -> Result<()>;
}

/// Gateway that logs instead of delivering; the default for `rosterd serve`.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationGateway for LoggingNotifier {
    async fn notify(&self, user_id: Uuid, kind: NotificationType, payload: Value) -> Result<()> {
        tracing::info!(user_id = %user_id, kind = %kind, payload = %payload, "Dispatching notification");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LoggingMailer;

#[async_trait]
impl MailGateway for LoggingMailer {
    async fn send_shift_assigned_email(
        &self,
        recipient: &str,
        worker_name: &str,
        shift: &Shift,
    ) -> Result<()> {
        tracing::info!(
            recipient,
            worker_name,
            shift_id = %shift.id,
            start_date = %shift.start_date,
            "Sending shift-assigned email"
        );
        Ok(())
    }
}

/// Test double that records every dispatched notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Uuid, NotificationType, Value)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Uuid, NotificationType, Value)> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }

    pub fn count_of(&self, kind: NotificationType) -> usize {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn notify(&self, user_id: Uuid, kind: NotificationType, payload: Value) -> Result<()> {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push((user_id, kind, payload));
        Ok(())
    }
}

/// Test double that records email recipients.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

#[async_trait]
impl MailGateway for RecordingMailer {
    async fn send_shift_assigned_email(
        &self,
        recipient: &str,
        _worker_name: &str,
        _shift: &Shift,
    ) -> Result<()> {
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(recipient.to_string());
        Ok(())
    }
}
