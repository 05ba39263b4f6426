//! Background sweep that marks no-show shifts as missed.

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::notify::{NotificationGateway, NotificationType};
use crate::shift::lifecycle::ShiftEvent;
use crate::store::ShiftStore;

/// Periodically transitions overdue scheduled shifts with zero check-ins
/// to Missed.
///
/// The transition is conditioned at write time inside the store, so a
/// check-in racing the sweep can never be silently overwritten, and vice
/// versa. Per-shift failures are logged and do not abort the batch.
pub struct MissedShiftSweeper {
    store: Arc<ShiftStore>,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl MissedShiftSweeper {
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

    /// Run until the token is cancelled, sweeping once per interval tick.
    pub async fn run(&self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.sweep_interval());
        tracing::info!(
            interval_secs = self.config.sweep_interval_secs,
            "Missed-shift sweeper started"
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Missed-shift sweeper shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    /// One pass over overdue scheduled shifts. Returns how many shifts
    /// were marked missed.
    pub async fn sweep_once(&self) -> usize {
        let now = self.clock.now();
        let cutoff = now - self.config.missed_after();
        let candidates = self.store.sweep_candidates(cutoff).await;

        let mut missed = 0;
        for shift_id in candidates {
            match self
                .store
                .apply_event(shift_id, ShiftEvent::SweepDeadlinePassed, now)
                .await
            {
                Ok(Some(status)) => {
                    missed += 1;
                    tracing::info!(shift_id = %shift_id, status = %status, "Shift marked missed, no check-ins recorded");
                    self.notify_missed(shift_id).await;
                }
                // A check-in won the race; leave the shift alone.
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(shift_id = %shift_id, error = %e, "Sweep failed for shift, continuing");
                }
            }
        }

        if missed > 0 {
            tracing::info!(missed, "Sweep pass complete");
        }
        missed
    }

    async fn notify_missed(&self, shift_id: crate::shift::model::ShiftId) {
        match self.store.shift(shift_id).await {
            Ok(shift) => {
                if let Err(e) = self
                    .notifier
                    .notify(
                        shift.created_by,
                        NotificationType::ShiftMissed,
                        json!({ "shiftId": shift_id, "startDate": shift.start_date }),
                    )
                    .await
                {
                    tracing::warn!(shift_id = %shift_id, error = %e, "Failed to send missed-shift notification");
                }
            }
            Err(e) => {
                tracing::warn!(shift_id = %shift_id, error = %e, "Missed shift vanished before notification");
            }
        }
    }
}
