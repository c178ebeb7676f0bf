pub mod core;

// Re-export commonly used types
pub use crate::core::builder::NetlistBuilder;
pub use crate::core::clock::{ClockState, TriggerKind};
pub use crate::core::components::{
    Behavior, FlipFlopKind, GateOp, OnGoal, PinKind, SequentialPhase,
};
pub use crate::core::connections::Netlist;
pub use crate::core::errors::SimError;
pub use crate::core::execution::{
    ConcurrencyMode, SimulationConfig, Simulator, StepOutcome, TickOutcome, TickReport, Trace,
};
pub use crate::core::testing::{TestReport, TestRunner, TestVector};
pub use crate::core::types::{ComponentId, NetId, PortRef, SimTime};
pub use crate::core::values::{BitState, Value};

/// Install an `env_logger` backend at `level`. `RUST_LOG`, when set,
/// overrides the level. Calling it again is harmless and returns an error.
pub fn init_logging(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init()
}
