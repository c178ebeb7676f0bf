//! Configuration for simulation execution
//!
//! Budgets that bound a single tick, the base seed for random components,
//! and the concurrency settings used when running independent test-vector
//! sets. Propagation inside one simulator is always single-threaded.

use serde::{Deserialize, Serialize};

/// Default number of events processed at one simulated instant before the
/// tick is declared oscillating
pub const DEFAULT_OSCILLATION_BUDGET: usize = 1000;

/// Default hard cap on events per tick
pub const DEFAULT_MAX_EVENTS_PER_TICK: usize = 100_000;

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Vector sets run one after another on the calling thread
    Sequential,
    /// Vector sets run on cloned simulators in a Rayon pool
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Events allowed without simulated time advancing
    pub oscillation_budget: usize,
    /// Events allowed in one tick regardless of time; catches loops that
    /// contain delay and therefore keep advancing time
    pub max_events_per_tick: usize,
    pub concurrency_mode: ConcurrencyMode,
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
    /// Seed for random components that do not carry their own
    pub random_seed: u64,
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self {
            oscillation_budget: DEFAULT_OSCILLATION_BUDGET,
            max_events_per_tick: DEFAULT_MAX_EVENTS_PER_TICK,
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
            random_seed: 0,
        }
    }

    pub fn with_oscillation_budget(mut self, events: usize) -> Self {
        self.oscillation_budget = events;
        self
    }

    pub fn with_max_events_per_tick(mut self, events: usize) -> Self {
        self.max_events_per_tick = events;
        self
    }

    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
