//! Logic gates and buffers.
//!
//! Every gate drives its result on port 0 and reads its operands from the
//! following ports.

use super::types::PortSpec;
use crate::core::errors::SimError;
use crate::core::values::Value;
use serde::{Deserialize, Serialize};

/// Result port of every gate
pub const OUT: usize = 0;
/// Single operand of `Not`, `Buffer` and `ControlledBuffer`
pub const IN: usize = 1;
/// Enable input of a `ControlledBuffer`
pub const CTRL: usize = 2;

/// Port index of the `i`-th gate operand
pub fn input(i: usize) -> usize {
    i + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateOp {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
}

impl GateOp {
    fn negated(self) -> bool {
        matches!(self, GateOp::Nand | GateOp::Nor | GateOp::Xnor)
    }
}

pub fn gate_ports(width: u8, inputs: u8) -> Vec<PortSpec> {
    let mut ports = vec![PortSpec::output(width)];
    ports.extend((0..inputs).map(|_| PortSpec::input(width)));
    ports
}

pub fn unary_ports(width: u8) -> Vec<PortSpec> {
    vec![PortSpec::output(width), PortSpec::input(width)]
}

pub fn controlled_buffer_ports(width: u8) -> Vec<PortSpec> {
    vec![
        PortSpec::output(width),
        PortSpec::input(width),
        PortSpec::input(1),
    ]
}

/// Fold the operands with `op`. `Xor` is odd parity over all operands.
/// With no operands the gate has nothing to drive and yields `X`.
pub fn eval_gate(op: GateOp, width: u8, operands: &[Value]) -> Result<Value, SimError> {
    let Some((first, rest)) = operands.split_first() else {
        return Ok(Value::unknown(width));
    };
    let mut acc = *first;
    for operand in rest {
        acc = match op {
            GateOp::And | GateOp::Nand => acc.and(operand)?,
            GateOp::Or | GateOp::Nor => acc.or(operand)?,
            GateOp::Xor | GateOp::Xnor => acc.xor(operand)?,
        };
    }
    Ok(if op.negated() { acc.not() } else { acc })
}

/// A tri-state buffer. When the control bit is `0` it stops driving, which
/// in a four-state world means it contributes `X` to its net.
pub fn eval_controlled(input: &Value, ctrl: &Value, inverting: bool) -> Value {
    let width = input.width();
    match ctrl.to_u64() {
        Some(1) => {
            if inverting {
                input.not()
            } else {
                *input
            }
        }
        Some(_) => Value::unknown(width),
        None if ctrl.is_error_value() => Value::error(width),
        None => Value::unknown(width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(text: &str) -> Value {
        Value::parse(text, text.len() as u8).unwrap()
    }

    #[test]
    fn test_and_or_truth() {
        assert_eq!(
            eval_gate(GateOp::And, 1, &[Value::TRUE, Value::FALSE]).unwrap(),
            Value::FALSE
        );
        assert_eq!(
            eval_gate(GateOp::Or, 1, &[Value::UNKNOWN, Value::TRUE]).unwrap(),
            Value::TRUE
        );
        assert_eq!(
            eval_gate(GateOp::And, 1, &[Value::UNKNOWN, Value::FALSE]).unwrap(),
            Value::FALSE
        );
        assert_eq!(
            eval_gate(GateOp::Nand, 4, &[v("1100"), v("1010")]).unwrap(),
            v("0111")
        );
    }

    #[test]
    fn test_xor_is_parity() {
        let out = eval_gate(GateOp::Xor, 1, &[Value::TRUE, Value::TRUE, Value::TRUE]).unwrap();
        assert_eq!(out, Value::TRUE);
        let out = eval_gate(GateOp::Xnor, 1, &[Value::TRUE, Value::FALSE]).unwrap();
        assert_eq!(out, Value::FALSE);
    }

    #[test]
    fn test_error_poisons_gate() {
        let out = eval_gate(GateOp::Or, 2, &[v("E0"), v("11")]).unwrap();
        assert!(out.is_error_value());
    }

    #[test]
    fn test_gate_without_operands_drives_nothing() {
        assert!(eval_gate(GateOp::Nand, 3, &[]).unwrap().is_unknown());
        assert_eq!(eval_gate(GateOp::Xor, 1, &[Value::TRUE]).unwrap(), Value::TRUE);
    }

    #[test]
    fn test_width_mismatch_is_reported() {
        let err = eval_gate(GateOp::And, 2, &[v("10"), v("1")]).unwrap_err();
        assert!(matches!(err, SimError::WidthMismatch { .. }));
    }

    #[test]
    fn test_controlled_buffer() {
        let data = v("1010");
        assert_eq!(eval_controlled(&data, &Value::TRUE, false), data);
        assert_eq!(eval_controlled(&data, &Value::TRUE, true), v("0101"));
        assert_eq!(eval_controlled(&data, &Value::FALSE, false), Value::unknown(4));
        assert_eq!(eval_controlled(&data, &Value::UNKNOWN, false), Value::unknown(4));
        assert_eq!(eval_controlled(&data, &Value::ERROR, false), Value::error(4));
    }
}
