use std::time::Duration;

/// Timing policy for the shift engine.
///
/// The late-check-in grace and missed-shift cutoff were fixed constants in
/// the upstream system; here they are configuration with the same defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// A check-in later than shift start plus this many minutes is flagged late.
    pub late_grace_mins: u64,
    /// A scheduled shift with zero check-ins this many minutes after its
    /// start is swept to missed.
    pub missed_after_mins: u64,
    /// Seconds between missed-shift sweeper passes.
    pub sweep_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            late_grace_mins: 15,
            missed_after_mins: 60,
            sweep_interval_secs: 3600,
        }
    }
}

impl EngineConfig {
    pub fn with_late_grace_mins(mut self, mins: u64) -> Self {
        self.late_grace_mins = mins;
        self
    }

    pub fn with_missed_after_mins(mut self, mins: u64) -> Self {
        self.missed_after_mins = mins;
        self
    }

    pub fn with_sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }

    pub fn late_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.late_grace_mins as i64)
    }

    pub fn missed_after(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.missed_after_mins as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
