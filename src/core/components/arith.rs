//! Arithmetic blocks built on [`Value::add`] and [`Value::negate`].

use super::types::PortSpec;
use crate::core::errors::SimError;
use crate::core::values::{BitState, Value};

pub mod adder {
    pub const OUT: usize = 0;
    pub const A: usize = 1;
    pub const B: usize = 2;
    pub const CIN: usize = 3;
    pub const COUT: usize = 4;
}

pub mod negator {
    pub const OUT: usize = 0;
    pub const IN: usize = 1;
}

pub fn adder_ports(width: u8) -> Vec<PortSpec> {
    vec![
        PortSpec::output(width),
        PortSpec::input(width),
        PortSpec::input(width),
        PortSpec::input(1),
        PortSpec::output(1),
    ]
}

/// Sum and carry out. An undriven (`X`) carry-in counts as `0`, so an adder
/// with its carry pin left open behaves as a plain two-operand adder.
pub fn eval_adder(a: &Value, b: &Value, carry_in: &Value) -> Result<(Value, Value), SimError> {
    let cin = match carry_in.get(0) {
        BitState::Unknown => BitState::Zero,
        state => state,
    };
    let (sum, carry) = a.add(b, cin)?;
    let carry = Value::repeat(carry, 1);
    Ok((sum, carry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adder_with_carry() {
        let (sum, carry) =
            eval_adder(&Value::known(8, 0xF0), &Value::known(8, 0x20), &Value::FALSE).unwrap();
        assert_eq!(sum, Value::known(8, 0x10));
        assert_eq!(carry, Value::TRUE);

        let (sum, carry) =
            eval_adder(&Value::known(4, 2), &Value::known(4, 3), &Value::TRUE).unwrap();
        assert_eq!(sum, Value::known(4, 6));
        assert_eq!(carry, Value::FALSE);
    }

    #[test]
    fn test_open_carry_in_is_zero() {
        let (sum, _) =
            eval_adder(&Value::known(4, 2), &Value::known(4, 3), &Value::UNKNOWN).unwrap();
        assert_eq!(sum, Value::known(4, 5));
    }

    #[test]
    fn test_unknown_operand_poisons_upper_bits() {
        let a = Value::parse("0b0x01", 4).unwrap();
        let (sum, carry) = eval_adder(&a, &Value::known(4, 1), &Value::FALSE).unwrap();
        assert_eq!(sum.to_string(), "xx10");
        assert_eq!(carry, Value::UNKNOWN);
    }
}
