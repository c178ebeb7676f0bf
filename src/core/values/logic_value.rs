//! Four-state multi-bit logic values.
//!
//! A [`Value`] is an immutable, fixed-width vector of up to 64 bits where
//! every bit is one of `0`, `1`, `X` (unknown) or `E` (error). It is stored
//! as three bit-planes; a bit set in `error` is `E`, otherwise a bit set in
//! `unknown` is `X`, otherwise the bit in `value` is the defined level.

use crate::core::errors::SimError;
use serde::{Deserialize, Serialize};

/// Widest value the engine represents
pub const MAX_WIDTH: u8 = 64;

/// Validate a requested width and narrow it to `u8`
pub fn check_width(width: u32) -> Result<u8, SimError> {
    if width > MAX_WIDTH as u32 {
        return Err(SimError::InvalidWidth {
            width,
            reason: format!("widths are limited to {} bits", MAX_WIDTH),
        });
    }
    Ok(width as u8)
}

fn mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// State of a single bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitState {
    Zero,
    One,
    Unknown,
    Error,
}

impl BitState {
    pub fn is_defined(self) -> bool {
        matches!(self, BitState::Zero | BitState::One)
    }

    pub fn to_char(self) -> char {
        match self {
            BitState::Zero => '0',
            BitState::One => '1',
            BitState::Unknown => 'x',
            BitState::Error => 'E',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(BitState::Zero),
            '1' => Some(BitState::One),
            'x' | 'X' | '?' => Some(BitState::Unknown),
            'e' | 'E' => Some(BitState::Error),
            _ => None,
        }
    }
}

impl From<bool> for BitState {
    fn from(b: bool) -> Self {
        if b {
            BitState::One
        } else {
            BitState::Zero
        }
    }
}

/// An immutable multi-bit four-state value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawValue")]
pub struct Value {
    width: u8,
    error: u64,
    unknown: u64,
    value: u64,
}

/// Serialized planes, checked and normalised before they become a [`Value`]
#[derive(Deserialize)]
struct RawValue {
    width: u32,
    #[serde(default)]
    error: u64,
    #[serde(default)]
    unknown: u64,
    #[serde(default)]
    value: u64,
}

impl TryFrom<RawValue> for Value {
    type Error = SimError;

    fn try_from(raw: RawValue) -> Result<Self, Self::Error> {
        let width = check_width(raw.width)?;
        Ok(Value::from_planes(width, raw.error, raw.unknown, raw.value))
    }
}

impl Value {
    pub const FALSE: Value = Value {
        width: 1,
        error: 0,
        unknown: 0,
        value: 0,
    };
    pub const TRUE: Value = Value {
        width: 1,
        error: 0,
        unknown: 0,
        value: 1,
    };
    pub const UNKNOWN: Value = Value {
        width: 1,
        error: 0,
        unknown: 1,
        value: 0,
    };
    pub const ERROR: Value = Value {
        width: 1,
        error: 1,
        unknown: 0,
        value: 0,
    };
    /// The zero-width value
    pub const NIL: Value = Value {
        width: 0,
        error: 0,
        unknown: 0,
        value: 0,
    };

    /// Build a value from raw bit-planes, normalising so that each bit has
    /// exactly one state. Widths above [`MAX_WIDTH`] are clamped.
    pub fn from_planes(width: u8, error: u64, unknown: u64, value: u64) -> Self {
        let width = width.min(MAX_WIDTH);
        let m = mask(width);
        let error = error & m;
        let unknown = unknown & m & !error;
        let value = value & m & !error & !unknown;
        Self {
            width,
            error,
            unknown,
            value,
        }
    }

    /// A fully-defined value; bits above `width` are discarded
    pub fn known(width: u8, bits: u64) -> Self {
        Self::from_planes(width, 0, 0, bits)
    }

    pub fn unknown(width: u8) -> Self {
        Self::from_planes(width, 0, u64::MAX, 0)
    }

    pub fn error(width: u8) -> Self {
        Self::from_planes(width, u64::MAX, 0, 0)
    }

    /// Every bit set to `state`
    pub fn repeat(state: BitState, width: u8) -> Self {
        match state {
            BitState::Zero => Self::known(width, 0),
            BitState::One => Self::known(width, u64::MAX),
            BitState::Unknown => Self::unknown(width),
            BitState::Error => Self::error(width),
        }
    }

    pub fn from_bool(b: bool) -> Self {
        if b {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    /// Build a value from per-bit states, least significant bit first
    pub fn from_bits(bits: &[BitState]) -> Result<Self, SimError> {
        let width = check_width(bits.len() as u32)?;
        let mut out = Self::known(width, 0);
        for (i, b) in bits.iter().enumerate() {
            out = out.set(i as u8, *b);
        }
        Ok(out)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// State of bit `which`; out-of-range bits read as `Error`
    pub fn get(&self, which: u8) -> BitState {
        if which >= self.width {
            return BitState::Error;
        }
        let bit = 1u64 << which;
        if self.error & bit != 0 {
            BitState::Error
        } else if self.unknown & bit != 0 {
            BitState::Unknown
        } else if self.value & bit != 0 {
            BitState::One
        } else {
            BitState::Zero
        }
    }

    /// Per-bit states, least significant bit first
    pub fn bits(&self) -> Vec<BitState> {
        (0..self.width).map(|i| self.get(i)).collect()
    }

    /// Copy of this value with bit `which` replaced
    pub fn set(&self, which: u8, state: BitState) -> Self {
        if which >= self.width {
            return *self;
        }
        let bit = 1u64 << which;
        let (mut error, mut unknown, mut value) = (
            self.error & !bit,
            self.unknown & !bit,
            self.value & !bit,
        );
        match state {
            BitState::Zero => {}
            BitState::One => value |= bit,
            BitState::Unknown => unknown |= bit,
            BitState::Error => error |= bit,
        }
        Self::from_planes(self.width, error, unknown, value)
    }

    /// True iff no bit is `X` or `E`
    pub fn is_fully_defined(&self) -> bool {
        self.error == 0 && self.unknown == 0
    }

    /// True if any bit is `E`
    pub fn is_error_value(&self) -> bool {
        self.error != 0
    }

    /// True if the value is non-empty and every bit is `X`
    pub fn is_unknown(&self) -> bool {
        self.width > 0 && self.unknown == mask(self.width)
    }

    pub fn has_unknown(&self) -> bool {
        self.unknown != 0
    }

    /// Unsigned integer reading, available only when fully defined
    pub fn to_u64(&self) -> Option<u64> {
        if self.is_fully_defined() {
            Some(self.value)
        } else {
            None
        }
    }

    fn check_same_width(&self, other: &Value, context: &str) -> Result<(), SimError> {
        if self.width != other.width {
            return Err(SimError::width_mismatch(self.width, other.width, context));
        }
        Ok(())
    }

    /// Wire-resolution of two drivers.
    ///
    /// Bitwise: agreeing bits keep their level, `X` yields to the other
    /// side, disagreeing defined bits become `E`, and `E` dominates.
    pub fn combine(&self, other: &Value) -> Result<Value, SimError> {
        self.check_same_width(other, "combine")?;
        let known_both = !(self.unknown | other.unknown);
        let disagree = (self.value ^ other.value) & known_both;
        Ok(Value::from_planes(
            self.width,
            self.error | other.error | disagree,
            self.unknown & other.unknown,
            self.value | other.value,
        ))
    }

    /// Widen to `new_width`, filling with `0` or with the replicated top bit
    pub fn extend(&self, new_width: u32, sign_extend: bool) -> Result<Value, SimError> {
        let new_width = check_width(new_width)?;
        if new_width < self.width {
            return Err(SimError::InvalidWidth {
                width: new_width as u32,
                reason: format!("cannot extend a {}-bit value to fewer bits", self.width),
            });
        }
        if new_width == self.width {
            return Ok(*self);
        }
        let fill = if sign_extend && self.width > 0 {
            self.get(self.width - 1)
        } else {
            BitState::Zero
        };
        let upper = mask(new_width) & !mask(self.width);
        let (mut error, mut unknown, mut value) = (self.error, self.unknown, self.value);
        match fill {
            BitState::Zero => {}
            BitState::One => value |= upper,
            BitState::Unknown => unknown |= upper,
            BitState::Error => error |= upper,
        }
        Ok(Value::from_planes(new_width, error, unknown, value))
    }

    fn known_zeros(&self) -> u64 {
        mask(self.width) & !self.error & !self.unknown & !self.value
    }

    /// Bitwise AND; `0` dominates, any `E` bit poisons the whole result
    pub fn and(&self, other: &Value) -> Result<Value, SimError> {
        self.check_same_width(other, "and")?;
        if self.is_error_value() || other.is_error_value() {
            return Ok(Value::error(self.width));
        }
        let zeros = self.known_zeros() | other.known_zeros();
        let ones = self.value & other.value;
        Ok(Value::from_planes(self.width, 0, !(zeros | ones), ones))
    }

    /// Bitwise OR; `1` dominates, any `E` bit poisons the whole result
    pub fn or(&self, other: &Value) -> Result<Value, SimError> {
        self.check_same_width(other, "or")?;
        if self.is_error_value() || other.is_error_value() {
            return Ok(Value::error(self.width));
        }
        let ones = self.value | other.value;
        let zeros = self.known_zeros() & other.known_zeros();
        Ok(Value::from_planes(self.width, 0, !(zeros | ones), ones))
    }

    pub fn xor(&self, other: &Value) -> Result<Value, SimError> {
        self.check_same_width(other, "xor")?;
        if self.is_error_value() || other.is_error_value() {
            return Ok(Value::error(self.width));
        }
        let unknown = self.unknown | other.unknown;
        Ok(Value::from_planes(
            self.width,
            0,
            unknown,
            self.value ^ other.value,
        ))
    }

    pub fn not(&self) -> Value {
        if self.is_error_value() {
            return Value::error(self.width);
        }
        Value::from_planes(self.width, 0, self.unknown, !self.value)
    }

    /// Ripple addition with carry.
    ///
    /// Any `E` in the operands or carry poisons sum and carry. Otherwise the
    /// bits below the lowest `X` are exact and everything from that position
    /// upward, including the carry out, is `X`.
    pub fn add(&self, other: &Value, carry_in: BitState) -> Result<(Value, BitState), SimError> {
        self.check_same_width(other, "add")?;
        let width = self.width;
        if self.is_error_value() || other.is_error_value() || carry_in == BitState::Error {
            return Ok((Value::error(width), BitState::Error));
        }
        if width == 0 {
            return Ok((Value::NIL, carry_in));
        }
        let unknown_bits = self.unknown | other.unknown;
        let first_unknown = if carry_in == BitState::Unknown {
            Some(0u8)
        } else if unknown_bits != 0 {
            Some(unknown_bits.trailing_zeros() as u8)
        } else {
            None
        };
        let cin = u128::from(carry_in == BitState::One);
        match first_unknown {
            None => {
                let sum = self.value as u128 + other.value as u128 + cin;
                let carry = (sum >> width) & 1 == 1;
                Ok((Value::known(width, sum as u64), BitState::from(carry)))
            }
            Some(pos) => {
                let low = mask(pos);
                let sum = (self.value & low) as u128 + (other.value & low) as u128 + cin;
                Ok((
                    Value::from_planes(width, 0, !low, sum as u64 & low),
                    BitState::Unknown,
                ))
            }
        }
    }

    /// Two's complement negation under the same ripple rule as [`Value::add`]
    pub fn negate(&self) -> Value {
        if self.is_error_value() {
            return Value::error(self.width);
        }
        let inverted = self.not();
        match inverted.add(&Value::known(self.width, 0), BitState::One) {
            Ok((sum, _)) => sum,
            Err(_) => Value::error(self.width),
        }
    }

    /// Test-vector comparison with `self` as the expectation: bits that are
    /// `X` in the expectation match anything, all others must be identical.
    pub fn compatible(&self, actual: &Value) -> bool {
        if self.width != actual.width {
            return false;
        }
        let care = mask(self.width) & !self.unknown;
        (self.error & care) == (actual.error & care)
            && (self.unknown & care) == (actual.unknown & care)
            && (self.value & care) == (actual.value & care)
    }

    /// Bits `lo..lo + width` as a new value
    pub fn slice(&self, lo: u8, width: u8) -> Value {
        let shift = |plane: u64| if lo >= 64 { 0 } else { plane >> lo };
        Value::from_planes(
            width,
            shift(self.error),
            shift(self.unknown),
            shift(self.value),
        )
    }

    /// Concatenate parts, least significant part first
    pub fn concat(parts: &[Value]) -> Result<Value, SimError> {
        let total: u32 = parts.iter().map(|p| p.width as u32).sum();
        let width = check_width(total)?;
        let (mut error, mut unknown, mut value) = (0u64, 0u64, 0u64);
        let mut lo = 0u32;
        for part in parts {
            if lo < 64 {
                error |= part.error << lo;
                unknown |= part.unknown << lo;
                value |= part.value << lo;
            }
            lo += part.width as u32;
        }
        Ok(Value::from_planes(width, error, unknown, value))
    }

    /// Parse a value of the given width.
    ///
    /// Accepted forms: `-` (all `X`), `0x` hex, `0b` binary, a bare binary
    /// string of exactly `width` digits from `0 1 x E`, or a decimal integer
    /// (negative numbers are taken as two's complement).
    pub fn parse(text: &str, width: u8) -> Result<Value, SimError> {
        let fail = |reason: String| SimError::ValueParse {
            text: text.to_string(),
            reason,
        };
        let t = text.trim();
        if t == "-" {
            return Ok(Value::unknown(width));
        }
        if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
            let bits = u64::from_str_radix(hex, 16).map_err(|e| fail(e.to_string()))?;
            if bits & !mask(width) != 0 {
                return Err(fail(format!("does not fit in {} bits", width)));
            }
            return Ok(Value::known(width, bits));
        }
        let binary = t.strip_prefix("0b").or_else(|| t.strip_prefix("0B"));
        let looks_binary = t.len() == width as usize
            && t.chars().all(|c| BitState::from_char(c).is_some());
        if let Some(digits) = binary.or(if looks_binary { Some(t) } else { None }) {
            if digits.len() > width as usize {
                return Err(fail(format!("more than {} binary digits", width)));
            }
            let mut bits = Vec::with_capacity(width as usize);
            for c in digits.chars().rev() {
                let state = BitState::from_char(c)
                    .ok_or_else(|| fail(format!("'{}' is not a bit", c)))?;
                bits.push(state);
            }
            bits.resize(width as usize, BitState::Zero);
            return Value::from_bits(&bits);
        }
        let n: i128 = t.parse().map_err(|_| fail("not a number".to_string()))?;
        let limit = 1i128 << width;
        if n >= limit || n < -(limit / 2).max(1) {
            return Err(fail(format!("does not fit in {} bits", width)));
        }
        Ok(Value::known(width, n as u64))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", self.get(i).to_char())?;
        }
        Ok(())
    }
}
