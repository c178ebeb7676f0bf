use crate::core::clock::ClockState;
use crate::core::values::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Phase of a sequential component's latch cycle.
///
/// `Idle -> AwaitingTrigger` on an input change that does not fire,
/// `-> Latching` when the clock state reports a fresh fire, and back to
/// `Idle` once the propagator has scheduled the latched output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequentialPhase {
    Idle,
    AwaitingTrigger,
    Latching,
}

impl Default for SequentialPhase {
    fn default() -> Self {
        SequentialPhase::Idle
    }
}

impl SequentialPhase {
    pub fn on_inputs(&mut self, fired: bool) {
        *self = if fired {
            SequentialPhase::Latching
        } else {
            SequentialPhase::AwaitingTrigger
        };
    }

    pub fn complete(&mut self) {
        if *self == SequentialPhase::Latching {
            *self = SequentialPhase::Idle;
        }
    }
}

/// Stored word of a register or counter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterData {
    pub value: Value,
    pub clock: ClockState,
    pub phase: SequentialPhase,
}

impl RegisterData {
    pub fn new(width: u8) -> Self {
        Self {
            value: Value::known(width, 0),
            clock: ClockState::new(),
            phase: SequentialPhase::Idle,
        }
    }
}

/// Stages of a shift register; `stages[0]` is the oldest and drives `OUT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftData {
    pub stages: Vec<Value>,
    pub clock: ClockState,
    pub phase: SequentialPhase,
}

impl ShiftData {
    pub fn new(width: u8, length: u8) -> Self {
        Self {
            stages: vec![Value::known(width, 0); length.max(1) as usize],
            clock: ClockState::new(),
            phase: SequentialPhase::Idle,
        }
    }

    /// Drop the oldest stage and append `value` as the newest
    pub fn push(&mut self, value: Value) {
        self.stages.remove(0);
        self.stages.push(value);
    }

    pub fn clear(&mut self) {
        for stage in &mut self.stages {
            *stage = Value::known(stage.width(), 0);
        }
    }
}

/// Backing store of a RAM; unwritten addresses read as zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamData {
    pub contents: BTreeMap<u64, Value>,
    /// One clock state per write port
    pub clocks: Vec<ClockState>,
    pub phase: SequentialPhase,
}

impl RamData {
    pub fn new(data_bits: u8, write_ports: u8, image: &[u64]) -> Self {
        let contents = image
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0)
            .map(|(addr, word)| (addr as u64, Value::known(data_bits, *word)))
            .collect();
        Self {
            contents,
            clocks: vec![ClockState::new(); write_ports as usize],
            phase: SequentialPhase::Idle,
        }
    }

    pub fn read(&self, addr: u64, data_bits: u8) -> Value {
        self.contents
            .get(&addr)
            .copied()
            .unwrap_or_else(|| Value::known(data_bits, 0))
    }
}

/// Pseudo-random generator state
#[derive(Debug, Clone)]
pub struct RandomData {
    pub seed: u64,
    pub rng: StdRng,
    pub value: Value,
    pub clock: ClockState,
    pub phase: SequentialPhase,
}

impl RandomData {
    pub fn new(width: u8, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let value = Value::known(width, rng.gen());
        Self {
            seed,
            rng,
            value,
            clock: ClockState::new(),
            phase: SequentialPhase::Idle,
        }
    }

    pub fn step(&mut self, width: u8) {
        self.value = Value::known(width, self.rng.gen());
    }

    pub fn restart(&mut self, width: u8) {
        *self = RandomData {
            clock: self.clock.clone(),
            phase: self.phase,
            ..RandomData::new(width, self.seed)
        };
    }
}

/// Per-component mutable state, held in the simulator's arena
#[derive(Debug, Clone)]
pub enum ComponentState {
    Stateless,
    /// Value currently driven by an input pin
    Pin(Value),
    /// Number of half-steps a clock source has been advanced
    ClockSource { ticks: u64 },
    Register(RegisterData),
    /// One-bit stored state of a flip-flop
    FlipFlop(RegisterData),
    Counter(RegisterData),
    ShiftRegister(ShiftData),
    Ram(RamData),
    Random(RandomData),
}

impl ComponentState {
    pub fn phase(&self) -> Option<SequentialPhase> {
        match self {
            ComponentState::Register(data)
            | ComponentState::FlipFlop(data)
            | ComponentState::Counter(data) => Some(data.phase),
            ComponentState::ShiftRegister(data) => Some(data.phase),
            ComponentState::Ram(data) => Some(data.phase),
            ComponentState::Random(data) => Some(data.phase),
            _ => None,
        }
    }

    /// Finish a latch cycle after its outputs were scheduled
    pub fn complete_cycle(&mut self) {
        match self {
            ComponentState::Register(data)
            | ComponentState::FlipFlop(data)
            | ComponentState::Counter(data) => data.phase.complete(),
            ComponentState::ShiftRegister(data) => data.phase.complete(),
            ComponentState::Ram(data) => data.phase.complete(),
            ComponentState::Random(data) => data.phase.complete(),
            _ => {}
        }
    }

    pub fn has_indeterminate_clock(&self) -> bool {
        match self {
            ComponentState::Register(data)
            | ComponentState::FlipFlop(data)
            | ComponentState::Counter(data) => data.clock.is_indeterminate(),
            ComponentState::ShiftRegister(data) => data.clock.is_indeterminate(),
            ComponentState::Ram(data) => data.clocks.iter().any(|c| c.is_indeterminate()),
            ComponentState::Random(data) => data.clock.is_indeterminate(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle() {
        let mut phase = SequentialPhase::default();
        phase.on_inputs(false);
        assert_eq!(phase, SequentialPhase::AwaitingTrigger);
        phase.complete();
        assert_eq!(phase, SequentialPhase::AwaitingTrigger);
        phase.on_inputs(true);
        assert_eq!(phase, SequentialPhase::Latching);
        phase.complete();
        assert_eq!(phase, SequentialPhase::Idle);
    }

    #[test]
    fn test_ram_image_and_default_reads() {
        let ram = RamData::new(8, 1, &[0x11, 0, 0x33]);
        assert_eq!(ram.read(0, 8), Value::known(8, 0x11));
        assert_eq!(ram.read(1, 8), Value::known(8, 0));
        assert_eq!(ram.read(2, 8), Value::known(8, 0x33));
        assert_eq!(ram.clocks.len(), 1);
    }

    #[test]
    fn test_shift_stages_push_and_clear() {
        let mut data = ShiftData::new(8, 2);
        data.push(Value::known(8, 1));
        data.push(Value::known(8, 2));
        assert_eq!(data.stages, vec![Value::known(8, 1), Value::known(8, 2)]);
        data.clear();
        assert!(data.stages.iter().all(|s| *s == Value::known(8, 0)));
    }

    #[test]
    fn test_random_is_deterministic_per_seed() {
        let mut a = RandomData::new(16, 42);
        let mut b = RandomData::new(16, 42);
        for _ in 0..10 {
            a.step(16);
            b.step(16);
            assert_eq!(a.value, b.value);
        }
        let first = RandomData::new(16, 42).value;
        a.restart(16);
        assert_eq!(a.value, first);
    }
}
