use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    FetchingCandidates,
    Searching,
    Submitting,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::FetchingCandidates => write!(f, "fetching blocks"),
            Self::Searching => write!(f, "searching"),
            Self::Submitting => write!(f, "submitting"),
        }
    }
}

/// Statistics for one mining run.
///
/// Counters only ever grow, `successes <= attempts` holds after every
/// mutation and `keep_mining` never goes back to `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningSession {
    generation: u64,
    attempts: u64,
    successes: u64,
    keep_mining: bool,
    phase: Phase,
}

impl MiningSession {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            attempts: 0,
            successes: 0,
            keep_mining: true,
            phase: Phase::Idle,
        }
    }

    /// The placeholder published before anything has been mined.
    pub fn idle() -> Self {
        Self {
            keep_mining: false,
            ..Self::new(0)
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn keep_mining(&self) -> bool {
        self.keep_mining
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A run is live until it parks in [`Phase::Idle`], even if the pool
    /// simply ran dry with `keep_mining` still set.
    pub fn is_running(&self) -> bool {
        self.keep_mining && self.phase != Phase::Idle
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn record_success(&mut self) {
        self.attempts += 1;
        self.successes += 1;
    }

    pub fn record_failure(&mut self) {
        self.attempts += 1;
    }

    pub fn stop(&mut self) {
        self.keep_mining = false;
    }

    pub fn status_line(&self) -> String {
        format!(
            "{}: {} of {} attempts succeeded",
            self.phase, self.successes, self.attempts
        )
    }
}

/// Identifies the live mining run. Every start bumps the counter, so work
/// belonging to an older run can tell it has been abandoned.
#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
    stop_requested: AtomicU64,
}

impl Generation {
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    /// Ask the live run to stop at its next decision point.
    pub fn request_stop(&self) {
        self.stop_requested.store(self.current(), Ordering::SeqCst);
    }

    pub fn stop_requested(&self, generation: u64) -> bool {
        generation != 0 && self.stop_requested.load(Ordering::SeqCst) == generation
    }
}
