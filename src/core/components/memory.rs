//! Clocked components: flip-flops, register, counter, shift register, RAM
//! and random generator.
//!
//! Each evaluation first feeds the clock input(s) through the component's
//! [`ClockState`](crate::core::clock::ClockState) so a transition is consumed
//! exactly once, then updates the stored word and reports the output.

use super::state::{RamData, RandomData, RegisterData, ShiftData};
use super::types::{PortSpec, PortUpdate};
use crate::core::clock::TriggerKind;
use crate::core::values::Value;
use serde::{Deserialize, Serialize};

pub mod register {
    pub const OUT: usize = 0;
    pub const IN: usize = 1;
    pub const CK: usize = 2;
    pub const CLR: usize = 3;
    pub const EN: usize = 4;
}

pub mod flipflop {
    pub const Q: usize = 0;
    pub const NQ: usize = 1;
    pub const CK: usize = 2;
    /// Asynchronous reset to 0
    pub const CLR: usize = 3;
    /// Asynchronous set to 1
    pub const PRE: usize = 4;

    /// Port index of data input `i` (D, T, J/K or S/R in that order)
    pub fn input(i: usize) -> usize {
        i + 5
    }
}

pub mod shift_register {
    pub const OUT: usize = 0;
    pub const IN: usize = 1;
    pub const CK: usize = 2;
    pub const CLR: usize = 3;
    pub const SH: usize = 4;
    pub const LD: usize = 5;

    /// Parallel load input of stage `i`; stage 0 is the newest
    pub fn stage_in(i: usize) -> usize {
        6 + 2 * i
    }

    /// Parallel output of stage `i`
    pub fn stage_out(i: usize) -> usize {
        7 + 2 * i
    }
}

pub mod counter {
    pub const OUT: usize = 0;
    pub const IN: usize = 1;
    pub const CK: usize = 2;
    pub const CLR: usize = 3;
    pub const LD: usize = 4;
    pub const UD: usize = 5;
    pub const EN: usize = 6;
    pub const CARRY: usize = 7;
}

pub mod ram {
    pub const DOUT: usize = 0;
    pub const ADDR: usize = 1;
    pub const DIN: usize = 2;
    pub const WE: usize = 3;
    pub const CLK: usize = 4;
    /// Ports per access port
    pub const STRIDE: usize = 5;

    /// Absolute index of `offset` on access port `p`
    pub fn port(p: usize, offset: usize) -> usize {
        p * STRIDE + offset
    }
}

pub mod random {
    pub const OUT: usize = 0;
    pub const CK: usize = 1;
    pub const NXT: usize = 2;
    pub const RST: usize = 3;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlipFlopKind {
    D,
    T,
    JK,
    SR,
}

impl FlipFlopKind {
    pub fn input_count(self) -> usize {
        match self {
            FlipFlopKind::D | FlipFlopKind::T => 1,
            FlipFlopKind::JK | FlipFlopKind::SR => 2,
        }
    }

    /// Next state on a trigger, or `None` to keep the current one
    fn next(self, inputs: &[Value], current: Value) -> Option<Value> {
        let level = |i: usize| inputs.get(flipflop::input(i)).and_then(Value::to_u64);
        let next = match (self, level(0), level(1)) {
            (FlipFlopKind::D, _, _) => inputs[flipflop::input(0)],
            (FlipFlopKind::T, Some(1), _) => current.not(),
            (FlipFlopKind::T, Some(_), _) => current,
            (FlipFlopKind::JK, Some(0), Some(0)) | (FlipFlopKind::SR, Some(0), Some(0)) => current,
            (FlipFlopKind::JK, Some(1), Some(0)) | (FlipFlopKind::SR, Some(1), Some(0)) => Value::TRUE,
            (FlipFlopKind::JK, Some(0), Some(1)) | (FlipFlopKind::SR, Some(0), Some(1)) => Value::FALSE,
            (FlipFlopKind::JK, Some(1), Some(1)) => current.not(),
            // S and R together, or undefined inputs
            _ => return None,
        };
        next.is_fully_defined().then_some(next)
    }
}

/// What a counter does when it reaches its goal (max when counting up,
/// zero when counting down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnGoal {
    Wrap,
    Stay,
    Continue,
    Load,
}

impl Default for OnGoal {
    fn default() -> Self {
        OnGoal::Wrap
    }
}

pub fn register_ports(width: u8) -> Vec<PortSpec> {
    vec![
        PortSpec::output(width),
        PortSpec::input(width),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::input(1),
    ]
}

pub fn flipflop_ports(kind: FlipFlopKind) -> Vec<PortSpec> {
    let mut ports = vec![PortSpec::output(1), PortSpec::output(1)];
    ports.extend((0..3 + kind.input_count()).map(|_| PortSpec::input(1)));
    ports
}

pub fn shift_register_ports(width: u8, length: u8, parallel: bool) -> Vec<PortSpec> {
    let mut ports = vec![
        PortSpec::output(width),
        PortSpec::input(width),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::input(1),
    ];
    if parallel {
        for _ in 0..length {
            ports.push(PortSpec::input(width));
            ports.push(PortSpec::output(width));
        }
    }
    ports
}

pub fn counter_ports(width: u8) -> Vec<PortSpec> {
    vec![
        PortSpec::output(width),
        PortSpec::input(width),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::output(1),
    ]
}

pub fn ram_ports(addr_bits: u8, data_bits: u8, write_ports: u8) -> Vec<PortSpec> {
    (0..write_ports)
        .flat_map(|_| {
            [
                PortSpec::output(data_bits),
                PortSpec::input(addr_bits),
                PortSpec::input(data_bits),
                PortSpec::input(1),
                PortSpec::input(1),
            ]
        })
        .collect()
}

pub fn random_ports(width: u8) -> Vec<PortSpec> {
    vec![
        PortSpec::output(width),
        PortSpec::input(1),
        PortSpec::input(1),
        PortSpec::input(1),
    ]
}

fn is_true(value: &Value) -> bool {
    *value == Value::TRUE
}

/// Open (`X`) enables count as asserted
fn is_not_false(value: &Value) -> bool {
    *value != Value::FALSE
}

pub fn eval_register(trigger: TriggerKind, inputs: &[Value], data: &mut RegisterData) -> Vec<PortUpdate> {
    let fired = data.clock.update_clock(&inputs[register::CK], trigger);
    let transparent = data.clock.is_active(trigger);
    data.phase.on_inputs(fired);

    if is_true(&inputs[register::CLR]) {
        data.value = Value::known(data.value.width(), 0);
    } else if (fired || transparent) && is_not_false(&inputs[register::EN]) {
        data.value = inputs[register::IN];
    }
    vec![PortUpdate::new(register::OUT, data.value)]
}

/// Clear wins over preset; a trigger applies only a defined next state
pub fn eval_flipflop(
    kind: FlipFlopKind,
    trigger: TriggerKind,
    inputs: &[Value],
    data: &mut RegisterData,
) -> Vec<PortUpdate> {
    let fired = data.clock.update_clock(&inputs[flipflop::CK], trigger);
    let transparent = data.clock.is_active(trigger);
    data.phase.on_inputs(fired);

    if is_true(&inputs[flipflop::CLR]) {
        data.value = Value::FALSE;
    } else if is_true(&inputs[flipflop::PRE]) {
        data.value = Value::TRUE;
    } else if fired || transparent {
        if let Some(next) = kind.next(inputs, data.value) {
            data.value = next;
        }
    }
    vec![
        PortUpdate::new(flipflop::Q, data.value),
        PortUpdate::new(flipflop::NQ, data.value.not()),
    ]
}

/// Shift in `IN` on a trigger while `SH` is not 0, or load every stage when
/// `parallel` and `LD` is 1
pub fn eval_shift_register(
    trigger: TriggerKind,
    parallel: bool,
    inputs: &[Value],
    data: &mut ShiftData,
) -> Vec<PortUpdate> {
    let fired = data.clock.update_clock(&inputs[shift_register::CK], trigger);
    data.phase.on_inputs(fired);
    let length = data.stages.len();

    if is_true(&inputs[shift_register::CLR]) {
        data.clear();
    } else if fired {
        if parallel && is_true(&inputs[shift_register::LD]) {
            for i in (0..length).rev() {
                data.push(inputs[shift_register::stage_in(i)]);
            }
        } else if is_not_false(&inputs[shift_register::SH]) {
            data.push(inputs[shift_register::IN]);
        }
    }

    let mut updates = vec![PortUpdate::new(shift_register::OUT, data.stages[0])];
    if parallel {
        updates.extend((0..length).map(|i| {
            PortUpdate::new(shift_register::stage_out(i), data.stages[length - 1 - i])
        }));
    }
    updates
}

pub fn eval_counter(
    max: u64,
    trigger: TriggerKind,
    on_goal: OnGoal,
    inputs: &[Value],
    data: &mut RegisterData,
) -> Vec<PortUpdate> {
    let width = data.value.width();
    let fired = data.clock.update_clock(&inputs[counter::CK], trigger);
    data.phase.on_inputs(fired);

    let up = is_not_false(&inputs[counter::UD]);
    let goal = if up { max } else { 0 };
    // Undefined load data loads as zero.
    let load = inputs[counter::IN].to_u64().map_or(0, |v| v.min(max));

    let next: Option<u64> = if is_true(&inputs[counter::CLR]) {
        Some(0)
    } else if !fired {
        return counter_outputs(data.value, goal);
    } else if is_true(&inputs[counter::LD]) {
        Some(load)
    } else {
        match data.value.to_u64() {
            None => None,
            Some(old) if !is_not_false(&inputs[counter::EN]) => Some(old),
            Some(old) if old == goal => Some(match on_goal {
                OnGoal::Wrap => {
                    if up {
                        0
                    } else {
                        max
                    }
                }
                OnGoal::Stay => old,
                OnGoal::Load => load,
                OnGoal::Continue => step(old, up),
            }),
            Some(old) => Some(step(old, up)),
        }
    };

    data.value = match next {
        Some(v) => Value::known(width, v),
        None => Value::error(width),
    };
    counter_outputs(data.value, goal)
}

fn counter_outputs(value: Value, goal: u64) -> Vec<PortUpdate> {
    let carry = match value.to_u64() {
        Some(v) => Value::from_bool(v == goal),
        None => Value::UNKNOWN,
    };
    vec![
        PortUpdate::new(counter::OUT, value),
        PortUpdate::new(counter::CARRY, carry),
    ]
}

fn step(old: u64, up: bool) -> u64 {
    if up {
        old.wrapping_add(1)
    } else {
        old.wrapping_sub(1)
    }
}

/// Clocked writes (port order, so a later port wins on the same address),
/// then asynchronous reads on every port.
pub fn eval_ram(data_bits: u8, trigger: TriggerKind, inputs: &[Value], data: &mut RamData) -> Vec<PortUpdate> {
    let ports = data.clocks.len();
    let mut any_fired = false;
    for p in 0..ports {
        let fired = data.clocks[p].update_clock(&inputs[ram::port(p, ram::CLK)], trigger);
        any_fired |= fired;
        if !fired || !is_true(&inputs[ram::port(p, ram::WE)]) {
            continue;
        }
        if let Some(addr) = inputs[ram::port(p, ram::ADDR)].to_u64() {
            data.contents.insert(addr, inputs[ram::port(p, ram::DIN)]);
        }
    }
    data.phase.on_inputs(any_fired);

    (0..ports)
        .map(|p| {
            let out = match inputs[ram::port(p, ram::ADDR)].to_u64() {
                Some(addr) => data.read(addr, data_bits),
                None => Value::unknown(data_bits),
            };
            PortUpdate::new(ram::port(p, ram::DOUT), out)
        })
        .collect()
}

pub fn eval_random(trigger: TriggerKind, inputs: &[Value], data: &mut RandomData) -> Vec<PortUpdate> {
    let width = data.value.width();
    let fired = data.clock.update_clock(&inputs[random::CK], trigger);
    data.phase.on_inputs(fired);

    if is_true(&inputs[random::RST]) {
        data.restart(width);
    } else if fired && is_not_false(&inputs[random::NXT]) {
        data.step(width);
    }
    vec![PortUpdate::new(random::OUT, data.value)]
}
