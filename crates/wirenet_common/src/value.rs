//! Packed multi-bit wire values.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vector of four-valued [`Logic`] bits packed for efficient storage.
///
/// Each bit occupies 2 bits of storage, with 32 bits packed per `u64` word.
/// Bit 0 is the least significant bit. A value of width 0 is NIL: the
/// "undefined" value broadcast on bundles whose width could not be resolved.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    width: u32,
    /// Packed storage: 2 bits per logic value, 32 values per u64.
    data: Vec<u64>,
}

/// Number of logic values packed per u64 word.
const VALUES_PER_WORD: u32 = 32;

impl Value {
    /// Returns the NIL value (width 0).
    pub fn nil() -> Self {
        Self {
            width: 0,
            data: Vec::new(),
        }
    }

    /// Creates a value of the given width with every bit set to `bit`.
    pub fn repeat(bit: Logic, width: u32) -> Self {
        let mut pattern = 0u64;
        for slot in 0..VALUES_PER_WORD {
            pattern |= (bit as u64) << (slot * 2);
        }
        let mut v = Self {
            width,
            data: vec![pattern; word_count(width)],
        };
        v.clear_tail();
        v
    }

    /// Creates an all-unknown value of the given width.
    pub fn unknown(width: u32) -> Self {
        Self::repeat(Logic::Unknown, width)
    }

    /// Creates an all-error value of the given width.
    pub fn error(width: u32) -> Self {
        Self::repeat(Logic::Error, width)
    }

    /// Creates a single-bit value from a boolean.
    pub fn from_bool(value: bool) -> Self {
        Self::repeat(Logic::from_bool(value), 1)
    }

    /// Creates a fully defined value from a `u64` with the given width.
    ///
    /// Bits beyond 64 are zero.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::repeat(Logic::Zero, width);
        for i in 0..width.min(64) {
            if (value >> i) & 1 != 0 {
                v.set(i, Logic::One);
            }
        }
        v
    }

    /// Creates a value from individual bits, least significant first.
    pub fn from_bits(bits: &[Logic]) -> Self {
        let mut v = Self::repeat(Logic::Zero, bits.len() as u32);
        for (i, bit) in bits.iter().enumerate() {
            v.set(i as u32, *bit);
        }
        v
    }

    /// Parses a binary string like `"10xE"` into a value.
    ///
    /// The leftmost character is the most significant bit (highest index).
    /// Returns `None` if the string contains invalid characters.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let bits = s
            .chars()
            .rev()
            .map(Logic::from_char)
            .collect::<Option<Vec<_>>>()?;
        Some(Self::from_bits(&bits))
    }

    /// Returns the number of bits in this value.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns `true` if this is the NIL value.
    pub fn is_nil(&self) -> bool {
        self.width == 0
    }

    /// Gets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        self.read(index)
    }

    /// Gets the bit at the given index, or `None` past the value's width.
    pub fn try_get(&self, index: u32) -> Option<Logic> {
        (index < self.width).then(|| self.read(index))
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(
            index < self.width,
            "index {index} out of bounds for width {}",
            self.width
        );
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        let mask = !(0b11u64 << bit_offset);
        self.data[word_idx] = (self.data[word_idx] & mask) | ((value as u64) << bit_offset);
    }

    /// Iterates over the bits, least significant first.
    pub fn bits(&self) -> impl Iterator<Item = Logic> + '_ {
        (0..self.width).map(|i| self.read(i))
    }

    /// Converts the value to a `u64`, if all bits are defined.
    ///
    /// Returns `None` for NIL, for values containing unknown or error bits,
    /// or if the width exceeds 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.width == 0 || self.width > 64 {
            return None;
        }
        let mut result = 0u64;
        for (i, bit) in self.bits().enumerate() {
            match bit {
                Logic::Zero => {}
                Logic::One => result |= 1 << i,
                Logic::Unknown | Logic::Error => return None,
            }
        }
        Some(result)
    }

    /// Returns true if every bit is `Zero` or `One` (and the value is not NIL).
    pub fn is_fully_defined(&self) -> bool {
        !self.is_nil() && self.bits().all(Logic::is_defined)
    }

    /// Returns true if every bit is `Unknown` (and the value is not NIL).
    pub fn is_all_unknown(&self) -> bool {
        !self.is_nil() && self.bits().all(|b| b == Logic::Unknown)
    }

    /// Returns true if any bit is `Error`.
    pub fn has_error(&self) -> bool {
        self.bits().any(|b| b == Logic::Error)
    }

    /// Combines two values driven onto the same wire, bit by bit.
    ///
    /// NIL is the identity. Two non-NIL values of different widths cannot be
    /// driven onto one wire and combine to all-error at the wider width.
    pub fn combine(&self, other: &Value) -> Value {
        if self.is_nil() {
            return other.clone();
        }
        if other.is_nil() {
            return self.clone();
        }
        if self.width != other.width {
            return Value::error(self.width.max(other.width));
        }
        let mut result = self.clone();
        for i in 0..self.width {
            result.set(i, self.read(i).combine(other.read(i)));
        }
        result
    }

    /// Replaces every unknown bit with `pull`, leaving other bits untouched.
    pub fn pull_unknown(&self, pull: Logic) -> Value {
        let mut result = self.clone();
        for i in 0..self.width {
            if self.read(i) == Logic::Unknown {
                result.set(i, pull);
            }
        }
        result
    }

    fn read(&self, index: u32) -> Logic {
        let word_idx = (index / VALUES_PER_WORD) as usize;
        let bit_offset = (index % VALUES_PER_WORD) * 2;
        Logic::from_bits(self.data[word_idx] >> bit_offset)
    }

    /// Zeroes the storage past `width` so equal values compare and hash equal.
    fn clear_tail(&mut self) {
        let used = self.width % VALUES_PER_WORD;
        if used != 0 {
            if let Some(last) = self.data.last_mut() {
                *last &= (1u64 << (used * 2)) - 1;
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            return write!(f, "-");
        }
        for i in (0..self.width).rev() {
            write!(f, "{}", self.read(i))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self})")
    }
}

/// Returns the number of u64 words needed to store `width` logic values.
fn word_count(width: u32) -> usize {
    width.div_ceil(VALUES_PER_WORD) as usize
}
