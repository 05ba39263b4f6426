//! Composition root wiring the store, collaborators, and subsystems.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::analytics::AnalyticsAggregator;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::directory::{InMemoryJobs, InMemoryUsers, JobRepository, UserDirectory};
use crate::notify::{LoggingMailer, LoggingNotifier, MailGateway, NotificationGateway};
use crate::sequence::{AtomicSequences, SequenceSource};
use crate::shift::{AssignmentTracker, ShiftLifecycleManager};
use crate::store::ShiftStore;
use crate::sweeper::MissedShiftSweeper;

/// External collaborators injected into the engine.
pub struct Collaborators {
    pub jobs: Arc<dyn JobRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub notifier: Arc<dyn NotificationGateway>,
    pub mailer: Arc<dyn MailGateway>,
    pub clock: Arc<dyn Clock>,
    pub sequences: Arc<dyn SequenceSource>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            jobs: Arc::new(InMemoryJobs::new()),
            users: Arc::new(InMemoryUsers::new()),
            notifier: Arc::new(LoggingNotifier),
            mailer: Arc::new(LoggingMailer),
            clock: Arc::new(SystemClock),
            sequences: Arc::new(AtomicSequences::new()),
        }
    }
}

/// The assembled shift coordination engine.
pub struct ShiftEngine {
    config: EngineConfig,
    store: Arc<ShiftStore>,
    lifecycle: ShiftLifecycleManager,
    attendance: AssignmentTracker,
    analytics: AnalyticsAggregator,
    sweeper: Arc<MissedShiftSweeper>,
}

impl ShiftEngine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let store = Arc::new(ShiftStore::new());

        let lifecycle = ShiftLifecycleManager::new(
            store.clone(),
            collaborators.jobs.clone(),
            collaborators.users.clone(),
            collaborators.notifier.clone(),
            collaborators.mailer.clone(),
            collaborators.clock.clone(),
            collaborators.sequences.clone(),
        );
        let attendance = AssignmentTracker::new(
            store.clone(),
            collaborators.notifier.clone(),
            collaborators.clock.clone(),
            config.clone(),
        );
        let analytics = AnalyticsAggregator::new(
            store.clone(),
            collaborators.jobs.clone(),
            collaborators.users.clone(),
        );
        let sweeper = Arc::new(MissedShiftSweeper::new(
            store.clone(),
            collaborators.notifier.clone(),
            collaborators.clock.clone(),
            config.clone(),
        ));

        Self {
            config,
            store,
            lifecycle,
            attendance,
            analytics,
            sweeper,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ShiftStore> {
        &self.store
    }

    pub fn lifecycle(&self) -> &ShiftLifecycleManager {
        &self.lifecycle
    }

    pub fn attendance(&self) -> &AssignmentTracker {
        &self.attendance
    }

    pub fn analytics(&self) -> &AnalyticsAggregator {
        &self.analytics
    }

    pub fn sweeper(&self) -> &Arc<MissedShiftSweeper> {
        &self.sweeper
    }

    /// Spawn the background sweeper; it stops when the token is cancelled.
    pub fn spawn_sweeper(&self, token: CancellationToken) -> JoinHandle<()> {
        let sweeper = self.sweeper.clone();
        tokio::spawn(async move {
            sweeper.run(token).await;
        })
    }
}
