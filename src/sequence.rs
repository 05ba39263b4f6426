use std::sync::atomic::{AtomicU64, Ordering};

/// Entity families that receive sequence-minted readable ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Shift,
    Assignment,
}

/// Mints monotonically increasing ids per entity kind.
///
/// Injected rather than global so tests control numbering and a persistent
/// implementation can swap in without touching callers.
pub trait SequenceSource: Send + Sync {
    /// Next id for the given kind; the first id handed out is 1.
    fn next(&self, kind: EntityKind) -> u64;
}

/// Process-local implementation backed by one atomic counter per kind.
#[derive(Debug, Default)]
pub struct AtomicSequences {
    shifts: AtomicU64,
    assignments: AtomicU64,
}

impl AtomicSequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(shifts: u64, assignments: u64) -> Self {
        Self {
            shifts: AtomicU64::new(shifts),
            assignments: AtomicU64::new(assignments),
        }
    }
}

impl SequenceSource for AtomicSequences {
    fn next(&self, kind: EntityKind) -> u64 {
        let counter = match kind {
            EntityKind::Shift => &self.shifts,
            EntityKind::Assignment => &self.assignments,
        };
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}
