use super::arith::{self, adder, negator};
use super::gates::{self, GateOp};
use super::memory::{self, FlipFlopKind, OnGoal};
use super::plexers::{self, decoder, demux, mux};
use super::state::{ComponentState, RamData, RandomData, RegisterData, ShiftData};
use super::types::{PortSpec, PortUpdate};
use super::wiring::{self, PinKind};
use crate::core::clock::TriggerKind;
use crate::core::errors::SimError;
use crate::core::types::SimTime;
use crate::core::values::{Value, MAX_WIDTH};
use serde::{Deserialize, Serialize};

/// Widest select input accepted by muxes and decoders
pub const MAX_SELECT_BITS: u8 = 5;
/// Widest RAM address bus
pub const MAX_ADDR_BITS: u8 = 24;
/// Largest gate fan-in
pub const MAX_GATE_INPUTS: u8 = 32;
/// Most stages in a shift register
pub const MAX_SHIFT_STAGES: u8 = 32;

/// Closed set of component kinds, each with its own parameters.
///
/// Port layouts are fixed per kind; the per-kind modules export the port
/// index constants (`register::IN`, `gates::input(i)`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    Pin { width: u8, kind: PinKind },
    Constant { value: Value },
    Probe { width: u8 },
    Clock { high: u32, low: u32, phase: u32 },
    Gate { op: GateOp, width: u8, inputs: u8 },
    Not { width: u8 },
    Buffer { width: u8 },
    ControlledBuffer { width: u8, inverting: bool },
    Mux { width: u8, select_bits: u8 },
    /// Unselected outputs drive 0, or nothing when `three_state`
    Demux {
        width: u8,
        select_bits: u8,
        three_state: bool,
    },
    Decoder { select_bits: u8 },
    Splitter { parts: Vec<u8> },
    Adder { width: u8 },
    Negator { width: u8 },
    FlipFlop { kind: FlipFlopKind, trigger: TriggerKind },
    Register { width: u8, trigger: TriggerKind },
    /// `parallel` adds a load input and an output per stage
    ShiftRegister {
        width: u8,
        length: u8,
        parallel: bool,
        trigger: TriggerKind,
    },
    Counter {
        width: u8,
        max: u64,
        trigger: TriggerKind,
        on_goal: OnGoal,
    },
    Ram {
        addr_bits: u8,
        data_bits: u8,
        write_ports: u8,
        trigger: TriggerKind,
        /// Initial contents from address 0, restored on reset
        image: Vec<u64>,
    },
    /// `seed == 0` takes the simulation's configured seed
    Random {
        width: u8,
        seed: u64,
        trigger: TriggerKind,
    },
}

impl Behavior {
    pub fn input_pin(width: u8) -> Self {
        Behavior::Pin {
            width,
            kind: PinKind::Input,
        }
    }

    pub fn output_pin(width: u8) -> Self {
        Behavior::Pin {
            width,
            kind: PinKind::Output,
        }
    }

    pub fn gate(op: GateOp, width: u8, inputs: u8) -> Self {
        Behavior::Gate { op, width, inputs }
    }

    pub fn flipflop(kind: FlipFlopKind) -> Self {
        Behavior::FlipFlop {
            kind,
            trigger: TriggerKind::Rising,
        }
    }

    pub fn register(width: u8) -> Self {
        Behavior::Register {
            width,
            trigger: TriggerKind::Rising,
        }
    }

    /// Short kind name used in log lines
    pub fn kind_name(&self) -> &'static str {
        match self {
            Behavior::Pin { kind: PinKind::Input, .. } => "input pin",
            Behavior::Pin { kind: PinKind::Output, .. } => "output pin",
            Behavior::Constant { .. } => "constant",
            Behavior::Probe { .. } => "probe",
            Behavior::Clock { .. } => "clock",
            Behavior::Gate { op, .. } => match op {
                GateOp::And => "and",
                GateOp::Or => "or",
                GateOp::Xor => "xor",
                GateOp::Nand => "nand",
                GateOp::Nor => "nor",
                GateOp::Xnor => "xnor",
            },
            Behavior::Not { .. } => "not",
            Behavior::Buffer { .. } => "buffer",
            Behavior::ControlledBuffer { .. } => "controlled buffer",
            Behavior::Mux { .. } => "mux",
            Behavior::Demux { .. } => "demux",
            Behavior::Decoder { .. } => "decoder",
            Behavior::Splitter { .. } => "splitter",
            Behavior::Adder { .. } => "adder",
            Behavior::Negator { .. } => "negator",
            Behavior::FlipFlop { kind, .. } => match kind {
                FlipFlopKind::D => "d flip-flop",
                FlipFlopKind::T => "t flip-flop",
                FlipFlopKind::JK => "jk flip-flop",
                FlipFlopKind::SR => "sr flip-flop",
            },
            Behavior::Register { .. } => "register",
            Behavior::ShiftRegister { .. } => "shift register",
            Behavior::Counter { .. } => "counter",
            Behavior::Ram { .. } => "ram",
            Behavior::Random { .. } => "random",
        }
    }

    /// Check parameters that `ports()` relies on
    pub fn validate(&self) -> Result<(), SimError> {
        let bad = |what: String| Err(SimError::config(format!("{}: {}", self.kind_name(), what)));
        match self {
            Behavior::Clock { high, low, .. } if *high == 0 || *low == 0 => {
                bad("clock high and low durations must be at least 1".to_string())
            }
            Behavior::Gate { inputs, .. } if *inputs == 0 || *inputs > MAX_GATE_INPUTS => {
                bad(format!("gate needs 1..={} inputs", MAX_GATE_INPUTS))
            }
            Behavior::Mux { select_bits, .. }
            | Behavior::Demux { select_bits, .. }
            | Behavior::Decoder { select_bits }
                if *select_bits == 0 || *select_bits > MAX_SELECT_BITS =>
            {
                bad(format!("select width must be 1..={}", MAX_SELECT_BITS))
            }
            Behavior::ShiftRegister { length, .. } if *length == 0 || *length > MAX_SHIFT_STAGES => {
                bad(format!("shift register needs 1..={} stages", MAX_SHIFT_STAGES))
            }
            Behavior::Splitter { parts } => {
                if parts.is_empty() {
                    return bad("splitter needs at least one part".to_string());
                }
                wiring::splitter_width(parts).map(|_| ())
            }
            Behavior::Ram {
                addr_bits,
                write_ports,
                ..
            } => {
                if *addr_bits == 0 || *addr_bits > MAX_ADDR_BITS {
                    return bad(format!("address width must be 1..={}", MAX_ADDR_BITS));
                }
                if !(1..=2).contains(write_ports) {
                    return bad("ram supports 1 or 2 ports".to_string());
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn ports(&self) -> Vec<PortSpec> {
        match self {
            Behavior::Pin { width, kind } => wiring::pin_ports(*width, *kind),
            Behavior::Constant { value } => vec![PortSpec::output(value.width())],
            Behavior::Probe { width } => vec![PortSpec::input(*width)],
            Behavior::Clock { .. } => vec![PortSpec::output(1)],
            Behavior::Gate { width, inputs, .. } => gates::gate_ports(*width, *inputs),
            Behavior::Not { width } | Behavior::Buffer { width } => gates::unary_ports(*width),
            Behavior::ControlledBuffer { width, .. } => gates::controlled_buffer_ports(*width),
            Behavior::Mux { width, select_bits } => plexers::mux_ports(*width, *select_bits),
            Behavior::Demux {
                width, select_bits, ..
            } => plexers::demux_ports(*width, *select_bits),
            Behavior::Decoder { select_bits } => plexers::decoder_ports(*select_bits),
            Behavior::Splitter { parts } => wiring::splitter_ports(parts),
            Behavior::Adder { width } => arith::adder_ports(*width),
            Behavior::Negator { width } => gates::unary_ports(*width),
            Behavior::FlipFlop { kind, .. } => memory::flipflop_ports(*kind),
            Behavior::Register { width, .. } => memory::register_ports(*width),
            Behavior::ShiftRegister {
                width,
                length,
                parallel,
                ..
            } => memory::shift_register_ports(*width, *length, *parallel),
            Behavior::Counter { width, .. } => memory::counter_ports(*width),
            Behavior::Ram {
                addr_bits,
                data_bits,
                write_ports,
                ..
            } => memory::ram_ports(*addr_bits, *data_bits, *write_ports),
            Behavior::Random { width, .. } => memory::random_ports(*width),
        }
    }

    pub fn default_delay(&self) -> SimTime {
        match self {
            Behavior::Pin { .. }
            | Behavior::Constant { .. }
            | Behavior::Probe { .. }
            | Behavior::Clock { .. }
            | Behavior::Splitter { .. } => 0,
            Behavior::FlipFlop { .. }
            | Behavior::Register { .. }
            | Behavior::Counter { .. }
            | Behavior::Random { .. } => 8,
            Behavior::ShiftRegister { .. } => 4,
            Behavior::Ram { .. } => 10,
            _ => 1,
        }
    }

    pub fn is_sequential(&self) -> bool {
        matches!(
            self,
            Behavior::FlipFlop { .. }
                | Behavior::Register { .. }
                | Behavior::ShiftRegister { .. }
                | Behavior::Counter { .. }
                | Behavior::Ram { .. }
                | Behavior::Random { .. }
        )
    }

    /// Whether `force_port` may drive this component
    pub fn is_forcible(&self) -> bool {
        matches!(
            self,
            Behavior::Pin {
                kind: PinKind::Input,
                ..
            }
        )
    }

    /// Fresh private state, as after construction or reset
    pub fn initial_state(&self, random_seed: u64) -> ComponentState {
        match self {
            // Input pins start low, as a freshly placed pin does.
            Behavior::Pin {
                width,
                kind: PinKind::Input,
            } => ComponentState::Pin(Value::known(*width, 0)),
            Behavior::Clock { .. } => ComponentState::ClockSource { ticks: 0 },
            Behavior::FlipFlop { .. } => ComponentState::FlipFlop(RegisterData::new(1)),
            Behavior::Register { width, .. } => ComponentState::Register(RegisterData::new(*width)),
            Behavior::ShiftRegister { width, length, .. } => {
                ComponentState::ShiftRegister(ShiftData::new(*width, *length))
            }
            Behavior::Counter { width, .. } => ComponentState::Counter(RegisterData::new(*width)),
            Behavior::Ram {
                data_bits,
                write_ports,
                image,
                ..
            } => ComponentState::Ram(RamData::new(*data_bits, *write_ports, image)),
            Behavior::Random { width, seed, .. } => {
                let seed = if *seed == 0 { random_seed } else { *seed };
                ComponentState::Random(RandomData::new(*width, seed))
            }
            _ => ComponentState::Stateless,
        }
    }

    /// Compute new output drives from the values seen on every port.
    ///
    /// `seen` is indexed by port; entries for pure outputs are ignored.
    /// `connected` is indexed the same way. Gates leave open inputs out.
    pub fn evaluate(
        &self,
        seen: &[Value],
        connected: &[bool],
        state: &mut ComponentState,
    ) -> Result<Vec<PortUpdate>, SimError> {
        let out = |value: Value| -> Result<Vec<PortUpdate>, SimError> {
            Ok(vec![PortUpdate::new(0, value)])
        };
        match (self, state) {
            (Behavior::Pin { kind: PinKind::Input, .. }, ComponentState::Pin(value)) => out(*value),
            (Behavior::Pin { kind: PinKind::Output, .. }, _) | (Behavior::Probe { .. }, _) => Ok(Vec::new()),
            (Behavior::Constant { value }, _) => out(*value),
            (Behavior::Clock { high, low, phase }, ComponentState::ClockSource { ticks }) => {
                out(wiring::clock_level(*ticks, *high, *low, *phase))
            }
            (Behavior::Gate { op, width, inputs }, _) => {
                let operands: Vec<Value> = (0..*inputs as usize)
                    .map(gates::input)
                    .filter(|port| connected.get(*port).copied().unwrap_or(true))
                    .map(|port| seen[port])
                    .collect();
                out(gates::eval_gate(*op, *width, &operands)?)
            }
            (Behavior::Not { .. }, _) => out(seen[gates::IN].not()),
            (Behavior::Buffer { .. }, _) => out(seen[gates::IN]),
            (Behavior::ControlledBuffer { inverting, .. }, _) => out(gates::eval_controlled(
                &seen[gates::IN],
                &seen[gates::CTRL],
                *inverting,
            )),
            (Behavior::Mux { width, .. }, _) => {
                out(plexers::eval_mux(*width, &seen[mux::SEL], &seen[mux::input(0)..]))
            }
            (
                Behavior::Demux {
                    select_bits,
                    three_state,
                    ..
                },
                _,
            ) => Ok(plexers::eval_demux(
                *select_bits,
                *three_state,
                &seen[demux::IN],
                &seen[demux::SEL],
            )
            .into_iter()
            .enumerate()
            .map(|(i, value)| PortUpdate::new(demux::output(i), value))
            .collect()),
            (Behavior::Decoder { select_bits }, _) => Ok(plexers::eval_decoder(
                *select_bits,
                &seen[decoder::SEL],
            )
            .into_iter()
            .enumerate()
            .map(|(i, value)| PortUpdate::new(decoder::output(i), value))
            .collect()),
            (Behavior::Splitter { parts }, _) => wiring::eval_splitter(parts, seen),
            (Behavior::Adder { .. }, _) => {
                let (sum, carry) =
                    arith::eval_adder(&seen[adder::A], &seen[adder::B], &seen[adder::CIN])?;
                Ok(vec![
                    PortUpdate::new(adder::OUT, sum),
                    PortUpdate::new(adder::COUT, carry),
                ])
            }
            (Behavior::Negator { .. }, _) => {
                Ok(vec![PortUpdate::new(negator::OUT, seen[negator::IN].negate())])
            }
            (Behavior::FlipFlop { kind, trigger }, ComponentState::FlipFlop(data)) => {
                Ok(memory::eval_flipflop(*kind, *trigger, seen, data))
            }
            (Behavior::Register { trigger, .. }, ComponentState::Register(data)) => {
                Ok(memory::eval_register(*trigger, seen, data))
            }
            (
                Behavior::ShiftRegister {
                    trigger, parallel, ..
                },
                ComponentState::ShiftRegister(data),
            ) => Ok(memory::eval_shift_register(*trigger, *parallel, seen, data)),
            (
                Behavior::Counter {
                    max,
                    trigger,
                    on_goal,
                    width,
                },
                ComponentState::Counter(data),
            ) => {
                let max = (*max).min(width_mask(*width));
                Ok(memory::eval_counter(max, *trigger, *on_goal, seen, data))
            }
            (
                Behavior::Ram {
                    data_bits, trigger, ..
                },
                ComponentState::Ram(data),
            ) => Ok(memory::eval_ram(*data_bits, *trigger, seen, data)),
            (Behavior::Random { trigger, .. }, ComponentState::Random(data)) => {
                Ok(memory::eval_random(*trigger, seen, data))
            }
            (behavior, _) => Err(SimError::config(format!(
                "{} evaluated with mismatched state",
                behavior.kind_name()
            ))),
        }
    }
}

fn width_mask(width: u8) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
