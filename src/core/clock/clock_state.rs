use crate::core::values::{BitState, Value};
use serde::{Deserialize, Serialize};

/// Which clock condition makes a sequential component latch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Latch on a clean `0 -> 1` transition
    Rising,
    /// Latch on a clean `1 -> 0` transition
    Falling,
    /// Transparent while the clock is `1`
    High,
    /// Transparent while the clock is `0`
    Low,
}

impl Default for TriggerKind {
    fn default() -> Self {
        TriggerKind::Rising
    }
}

impl TriggerKind {
    pub fn is_level(self) -> bool {
        matches!(self, TriggerKind::High | TriggerKind::Low)
    }
}

/// Last observed clock level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockLevel {
    Low,
    High,
    /// `X` or `E` was observed; no trigger fires until a clean level re-arms it
    Indeterminate,
}

impl ClockLevel {
    fn of(value: &Value) -> Self {
        match value.get(0) {
            BitState::Zero if value.width() == 1 => ClockLevel::Low,
            BitState::One if value.width() == 1 => ClockLevel::High,
            _ => ClockLevel::Indeterminate,
        }
    }
}

/// Edge/level tracking for one clock input.
///
/// Each transition is consumed exactly once: `update_clock` compares the new
/// raw value against the previously recorded one and then overwrites it, so
/// feeding the same value again never re-fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    last: ClockLevel,
}

impl Default for ClockState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockState {
    /// A clock state that has last seen `0`
    pub fn new() -> Self {
        Self {
            last: ClockLevel::Low,
        }
    }

    pub fn last_level(&self) -> ClockLevel {
        self.last
    }

    pub fn is_indeterminate(&self) -> bool {
        self.last == ClockLevel::Indeterminate
    }

    /// Record a new raw clock value; returns true exactly once per
    /// qualifying transition.
    pub fn update_clock(&mut self, value: &Value, trigger: TriggerKind) -> bool {
        let previous = self.last;
        let current = ClockLevel::of(value);
        self.last = current;
        match (previous, current) {
            (ClockLevel::Low, ClockLevel::High) => {
                matches!(trigger, TriggerKind::Rising | TriggerKind::High)
            }
            (ClockLevel::High, ClockLevel::Low) => {
                matches!(trigger, TriggerKind::Falling | TriggerKind::Low)
            }
            _ => false,
        }
    }

    /// For level triggers, whether the clock currently sits at the active
    /// level. Edge triggers are never "active".
    pub fn is_active(&self, trigger: TriggerKind) -> bool {
        match trigger {
            TriggerKind::High => self.last == ClockLevel::High,
            TriggerKind::Low => self.last == ClockLevel::Low,
            TriggerKind::Rising | TriggerKind::Falling => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(clock: &mut ClockState, seq: &[Value], trigger: TriggerKind) -> usize {
        seq.iter()
            .filter(|v| clock.update_clock(v, trigger))
            .count()
    }

    #[test]
    fn test_rising_edge_fires_exactly_once_per_transition() {
        let mut clock = ClockState::new();
        let seq = [
            Value::FALSE,
            Value::TRUE,
            Value::TRUE,
            Value::FALSE,
            Value::TRUE,
        ];
        assert_eq!(feed(&mut clock, &seq, TriggerKind::Rising), 2);
    }

    #[test]
    fn test_falling_edge() {
        let mut clock = ClockState::new();
        let seq = [Value::TRUE, Value::FALSE, Value::FALSE, Value::TRUE, Value::FALSE];
        assert_eq!(feed(&mut clock, &seq, TriggerKind::Falling), 2);
    }

    #[test]
    fn test_indeterminate_clock_requires_clean_rearm() {
        let mut clock = ClockState::new();
        assert!(!clock.update_clock(&Value::UNKNOWN, TriggerKind::Rising));
        assert!(clock.is_indeterminate());
        // X -> 1 is not a clean edge
        assert!(!clock.update_clock(&Value::TRUE, TriggerKind::Rising));
        assert!(!clock.is_indeterminate());
        assert!(!clock.update_clock(&Value::FALSE, TriggerKind::Rising));
        assert!(clock.update_clock(&Value::TRUE, TriggerKind::Rising));

        assert!(!clock.update_clock(&Value::ERROR, TriggerKind::Falling));
        assert!(!clock.update_clock(&Value::FALSE, TriggerKind::Falling));
    }

    #[test]
    fn test_level_triggers() {
        let mut clock = ClockState::new();
        assert!(clock.is_active(TriggerKind::Low));
        assert!(clock.update_clock(&Value::TRUE, TriggerKind::High));
        assert!(clock.is_active(TriggerKind::High));
        assert!(!clock.update_clock(&Value::TRUE, TriggerKind::High));
        assert!(clock.is_active(TriggerKind::High));
        assert!(!clock.is_active(TriggerKind::Rising));
    }

    #[test]
    fn test_wide_clock_is_indeterminate() {
        let mut clock = ClockState::new();
        assert!(!clock.update_clock(&Value::known(2, 1), TriggerKind::Rising));
        assert_eq!(clock.last_level(), ClockLevel::Indeterminate);
    }
}
