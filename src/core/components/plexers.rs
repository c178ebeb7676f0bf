//! Multiplexer, demultiplexer and decoder.

use super::types::PortSpec;
use crate::core::values::Value;

pub mod mux {
    pub const OUT: usize = 0;
    pub const SEL: usize = 1;

    /// Port index of data input `i`
    pub fn input(i: usize) -> usize {
        i + 2
    }
}

pub mod demux {
    pub const IN: usize = 0;
    pub const SEL: usize = 1;

    /// Port index of routed output `i`
    pub fn output(i: usize) -> usize {
        i + 2
    }
}

pub mod decoder {
    pub const SEL: usize = 0;

    /// Port index of decoded output `i`
    pub fn output(i: usize) -> usize {
        i + 1
    }
}

pub fn mux_ports(width: u8, select_bits: u8) -> Vec<PortSpec> {
    let mut ports = vec![PortSpec::output(width), PortSpec::input(select_bits)];
    ports.extend((0..1usize << select_bits).map(|_| PortSpec::input(width)));
    ports
}

pub fn demux_ports(width: u8, select_bits: u8) -> Vec<PortSpec> {
    let mut ports = vec![PortSpec::input(width), PortSpec::input(select_bits)];
    ports.extend((0..1usize << select_bits).map(|_| PortSpec::output(width)));
    ports
}

pub fn decoder_ports(select_bits: u8) -> Vec<PortSpec> {
    let mut ports = vec![PortSpec::input(select_bits)];
    ports.extend((0..1usize << select_bits).map(|_| PortSpec::output(1)));
    ports
}

/// Route the selected data input to the output
pub fn eval_mux(width: u8, select: &Value, data: &[Value]) -> Value {
    if select.is_error_value() {
        return Value::error(width);
    }
    match select.to_u64() {
        Some(index) => data
            .get(index as usize)
            .copied()
            .unwrap_or_else(|| Value::error(width)),
        None => Value::unknown(width),
    }
}

/// Route `input` to the selected output. The other outputs drive zero, or
/// stop driving (`X`) when `three_state` is set.
pub fn eval_demux(select_bits: u8, three_state: bool, input: &Value, select: &Value) -> Vec<Value> {
    let count = 1usize << select_bits;
    let width = input.width();
    if select.is_error_value() {
        return vec![Value::error(width); count];
    }
    let Some(chosen) = select.to_u64() else {
        return vec![Value::unknown(width); count];
    };
    let others = if three_state {
        Value::unknown(width)
    } else {
        Value::known(width, 0)
    };
    (0..count)
        .map(|i| if i as u64 == chosen { *input } else { others })
        .collect()
}

/// One-hot decode of `select` over `2^select_bits` single-bit outputs
pub fn eval_decoder(select_bits: u8, select: &Value) -> Vec<Value> {
    let count = 1usize << select_bits;
    if select.is_error_value() {
        return vec![Value::ERROR; count];
    }
    match select.to_u64() {
        Some(chosen) => (0..count)
            .map(|i| Value::from_bool(i as u64 == chosen))
            .collect(),
        None => vec![Value::UNKNOWN; count],
    }
}
