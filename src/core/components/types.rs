use crate::core::types::SimTime;
use crate::core::values::Value;

/// Direction of a component port
///
/// Inputs read their net, outputs drive it, and bidirectional ports do
/// both (splitters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    Input,
    Output,
    InOut,
}

impl PortDirection {
    /// Whether a port of this direction contributes a driven value to its net
    pub fn drives(self) -> bool {
        matches!(self, PortDirection::Output | PortDirection::InOut)
    }

    /// Whether a change on the net should re-evaluate the owning component
    pub fn reads(self) -> bool {
        matches!(self, PortDirection::Input | PortDirection::InOut)
    }
}

/// Declared shape of one port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortSpec {
    pub direction: PortDirection,
    pub width: u8,
}

impl PortSpec {
    pub fn input(width: u8) -> Self {
        Self {
            direction: PortDirection::Input,
            width,
        }
    }

    pub fn output(width: u8) -> Self {
        Self {
            direction: PortDirection::Output,
            width,
        }
    }

    pub fn inout(width: u8) -> Self {
        Self {
            direction: PortDirection::InOut,
            width,
        }
    }
}

/// A new value a component wants to drive on one of its ports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortUpdate {
    pub index: usize,
    pub value: Value,
}

impl PortUpdate {
    pub fn new(index: usize, value: Value) -> Self {
        Self { index, value }
    }
}

/// Result of one `propagate` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
    pub updates: Vec<PortUpdate>,
    pub delay: SimTime,
    /// A clock input was `X`/`E` during this evaluation
    pub indeterminate_clock: bool,
}
