pub mod clock_state;

// Re-export commonly used types
pub use clock_state::{ClockLevel, ClockState, TriggerKind};
