use super::types::{ComponentId, PortRef, SimTime};

/// Errors raised by the simulation core.
///
/// Value-domain anomalies (`X`, `Error` bits) are never reported here; they
/// are ordinary values. Only structural problems and terminal conditions
/// become a `SimError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Operands or ports of incompatible bit width
    WidthMismatch {
        expected: u8,
        actual: u8,
        context: String,
    },
    /// A width outside `0..=64`, or a narrowing extension
    InvalidWidth { width: u32, reason: String },
    /// Stimulus applied to a port that is not externally drivable
    NotAnInput { port: PortRef },
    /// Event budget exhausted without reaching stabilization
    Oscillation {
        time: SimTime,
        events: usize,
        components: Vec<ComponentId>,
    },
    /// A clocked component observed `X`/`Error` on its clock input
    IndeterminateClock { component: ComponentId },
    /// Malformed netlist
    Configuration(String),
    /// Text that does not denote a value of the requested width
    ValueParse { text: String, reason: String },
    /// Malformed test vector text
    TestVectorParse { line: usize, message: String },
}

impl SimError {
    pub fn width_mismatch(expected: u8, actual: u8, context: impl Into<String>) -> Self {
        SimError::WidthMismatch {
            expected,
            actual,
            context: context.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    /// Returns true for conditions that end only the current tick
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SimError::Oscillation { .. } | SimError::IndeterminateClock { .. }
        )
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::WidthMismatch {
                expected,
                actual,
                context,
            } => write!(
                f,
                "Width mismatch in {}: expected {} bits, got {}",
                context, expected, actual
            ),
            SimError::InvalidWidth { width, reason } => {
                write!(f, "Invalid width {}: {}", width, reason)
            }
            SimError::NotAnInput { port } => write!(f, "Port {} is not an input pin", port),
            SimError::Oscillation {
                time,
                events,
                components,
            } => {
                write!(
                    f,
                    "Oscillation detected at time {} after {} events",
                    time, events
                )?;
                if !components.is_empty() {
                    let names: Vec<String> = components.iter().map(|c| c.to_string()).collect();
                    write!(f, " (components: {})", names.join(", "))?;
                }
                Ok(())
            }
            SimError::IndeterminateClock { component } => {
                write!(f, "Clock input of {} is indeterminate", component)
            }
            SimError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            SimError::ValueParse { text, reason } => {
                write!(f, "Cannot parse value '{}': {}", text, reason)
            }
            SimError::TestVectorParse { line, message } => {
                write!(f, "Test vector line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for SimError {}
