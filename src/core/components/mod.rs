pub mod arith;
pub mod behavior;
pub mod component;
pub mod gates;
pub mod memory;
pub mod plexers;
pub mod state;
pub mod types;
pub mod wiring;

// Re-export commonly used types
pub use arith::{adder, negator};
pub use behavior::Behavior;
pub use component::Component;
pub use gates::GateOp;
pub use memory::{counter, flipflop, ram, random, register, shift_register, FlipFlopKind, OnGoal};
pub use plexers::{decoder, demux, mux};
pub use state::{ComponentState, SequentialPhase};
pub use types::{PortDirection, PortSpec, PortUpdate, Propagation};
pub use wiring::{splitter, PinKind};
