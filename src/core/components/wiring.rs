//! Pins, constants, probes, clock sources and splitters.

use super::types::{PortSpec, PortUpdate};
use crate::core::errors::SimError;
use crate::core::values::{check_width, Value};
use serde::{Deserialize, Serialize};

/// The only port of a pin, constant, probe or clock
pub const PORT: usize = 0;

pub mod splitter {
    /// Combined bus end
    pub const BUS: usize = 0;

    /// Port index of fan-out part `i` (least significant part first)
    pub fn part(i: usize) -> usize {
        i + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinKind {
    /// Externally forced; drives its net
    Input,
    /// Observes its net
    Output,
}

pub fn pin_ports(width: u8, kind: PinKind) -> Vec<PortSpec> {
    match kind {
        PinKind::Input => vec![PortSpec::output(width)],
        PinKind::Output => vec![PortSpec::input(width)],
    }
}

/// Width of the combined bus end
pub fn splitter_width(parts: &[u8]) -> Result<u8, SimError> {
    check_width(parts.iter().map(|w| u32::from(*w)).sum())
}

/// An oversized bus gets width 0, which port validation rejects
pub fn splitter_ports(parts: &[u8]) -> Vec<PortSpec> {
    let mut ports = vec![PortSpec::inout(splitter_width(parts).unwrap_or(0))];
    ports.extend(parts.iter().map(|w| PortSpec::inout(*w)));
    ports
}

/// Level of a clock source after `ticks` half-steps: low for the first `low`
/// steps of each period, then high for `high` steps
pub fn clock_level(ticks: u64, high: u32, low: u32, phase: u32) -> Value {
    let period = u64::from(high) + u64::from(low);
    if period == 0 {
        return Value::ERROR;
    }
    let position = (ticks + u64::from(phase)) % period;
    Value::from_bool(position >= u64::from(low))
}

/// Split the bus value onto the parts and join the part values onto the bus.
///
/// `seen` holds, per port, the value of its net without the splitter's own
/// contribution, so the two directions never reinforce each other.
pub fn eval_splitter(parts: &[u8], seen: &[Value]) -> Result<Vec<PortUpdate>, SimError> {
    let bus = seen[splitter::BUS];
    let joined = Value::concat(&seen[1..=parts.len()])?;

    let mut updates = Vec::with_capacity(parts.len() + 1);
    updates.push(PortUpdate::new(splitter::BUS, joined));
    let mut lo = 0u8;
    for (i, width) in parts.iter().enumerate() {
        updates.push(PortUpdate::new(splitter::part(i), bus.slice(lo, *width)));
        lo = lo.saturating_add(*width);
    }
    Ok(updates)
}
