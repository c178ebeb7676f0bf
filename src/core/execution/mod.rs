pub mod config;
pub mod event_scheduler;
pub mod propagator;
pub mod simulator;
pub mod trace;

// Re-export commonly used types
pub use config::{ConcurrencyMode, SimulationConfig};
pub use event_scheduler::{Event, EventScheduler};
pub use propagator::{Propagator, StepOutcome, TickOutcome, TickReport};
pub use simulator::Simulator;
pub use trace::{Trace, TraceRecord};
