use super::behavior::Behavior;
use super::state::ComponentState;
use super::types::{PortSpec, Propagation};
use crate::core::errors::SimError;
use crate::core::types::{ComponentId, SimTime};
use crate::core::values::Value;

/// A placed component: its behavior, resolved port shapes and delay.
///
/// Components are immutable once the netlist is built; everything that
/// changes during simulation lives in a separate [`ComponentState`].
#[derive(Debug, Clone)]
pub struct Component {
    pub id: ComponentId,
    pub label: Option<String>,
    pub behavior: Behavior,
    pub ports: Vec<PortSpec>,
    pub delay: SimTime,
    /// Per port, whether its net reaches another port. Set by the netlist;
    /// a standalone component treats every port as connected.
    pub connected: Vec<bool>,
}

impl Component {
    pub fn new(id: ComponentId, behavior: Behavior) -> Self {
        let ports = behavior.ports();
        let delay = behavior.default_delay();
        Self {
            id,
            label: None,
            behavior,
            connected: vec![true; ports.len()],
            ports,
            delay,
        }
    }

    pub fn port_width(&self, index: usize) -> Option<u8> {
        self.ports.get(index).map(|p| p.width)
    }

    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => format!("{} '{}'", self.behavior.kind_name(), label),
            None => format!("{} {}", self.behavior.kind_name(), self.id),
        }
    }

    /// Evaluate the component against the values seen on its ports.
    ///
    /// Fails with `WidthMismatch` when a value read from an input does not
    /// have the declared port width; the state is left untouched then.
    pub fn propagate(&self, seen: &[Value], state: &mut ComponentState) -> Result<Propagation, SimError> {
        if seen.len() != self.ports.len() {
            return Err(SimError::config(format!(
                "{} has {} ports but was given {} values",
                self.display_name(),
                self.ports.len(),
                seen.len()
            )));
        }
        for (index, (spec, value)) in self.ports.iter().zip(seen).enumerate() {
            if spec.direction.reads() && spec.width != value.width() {
                return Err(SimError::width_mismatch(
                    spec.width,
                    value.width(),
                    format!("{} input {}", self.display_name(), self.id.port(index)),
                ));
            }
        }

        let updates = self.behavior.evaluate(seen, &self.connected, state)?;
        Ok(Propagation {
            updates,
            delay: self.delay,
            indeterminate_clock: state.has_indeterminate_clock(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::gates::GateOp;

    #[test]
    fn test_propagate_reports_delay() {
        let gate = Component::new(ComponentId::from_raw(0), Behavior::gate(GateOp::Or, 1, 2));
        let mut state = gate.behavior.initial_state(0);
        let result = gate
            .propagate(&[Value::UNKNOWN, Value::TRUE, Value::FALSE], &mut state)
            .unwrap();
        assert_eq!(result.delay, 1);
        assert_eq!(result.updates[0].value, Value::TRUE);
        assert!(!result.indeterminate_clock);
    }

    #[test]
    fn test_open_gate_inputs_are_skipped() {
        let mut gate = Component::new(ComponentId::from_raw(0), Behavior::gate(GateOp::And, 1, 3));
        gate.connected = vec![true, true, false, true];
        let mut state = gate.behavior.initial_state(0);
        let result = gate
            .propagate(
                &[Value::UNKNOWN, Value::TRUE, Value::UNKNOWN, Value::TRUE],
                &mut state,
            )
            .unwrap();
        assert_eq!(result.updates[0].value, Value::TRUE);
    }

    #[test]
    fn test_input_width_is_checked() {
        let gate = Component::new(ComponentId::from_raw(3), Behavior::gate(GateOp::And, 4, 2));
        let mut state = gate.behavior.initial_state(0);
        let err = gate
            .propagate(
                &[Value::unknown(4), Value::known(4, 1), Value::known(2, 1)],
                &mut state,
            )
            .unwrap_err();
        match err {
            SimError::WidthMismatch {
                expected, actual, ..
            } => {
                assert_eq!((expected, actual), (4, 2));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_indeterminate_clock_is_flagged() {
        let reg = Component::new(ComponentId::from_raw(1), Behavior::register(1));
        let mut state = reg.behavior.initial_state(0);
        let result = reg
            .propagate(
                &[Value::UNKNOWN, Value::TRUE, Value::UNKNOWN, Value::FALSE, Value::TRUE],
                &mut state,
            )
            .unwrap();
        assert!(result.indeterminate_clock);
        assert_eq!(result.updates[0].value, Value::FALSE);
    }
}
