//! 64-bit fixed-point values built from two 32-bit limbs

use super::{borrow_flag, carry_flag, decompose, high_chunk, low_chunk, top_nibble};
use super::{FRACTION_SCALE, SHIFT_16};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A 64-bit two's-complement integer split into two 32-bit limbs.
///
/// The lowest 4 bits of `lo` are the fractional component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fixed64 {
    pub lo: i32,
    pub hi: i32,
}

impl Fixed64 {
    pub const ZERO: Fixed64 = Fixed64 { lo: 0, hi: 0 };

    pub const fn new(lo: i32, hi: i32) -> Self {
        Fixed64 { lo, hi }
    }

    /// Sign is the top bit of the high limb.
    pub fn is_negative(self) -> bool {
        self.hi < 0
    }

    /// Toggle bit `index` (0..64) of the raw value.
    pub fn flip_bit(&mut self, index: u32) {
        if index >= 32 {
            self.hi ^= 1 << (index - 32);
        } else {
            self.lo ^= 1 << index;
        }
    }

    /// Build a value from a raw (already left-shifted) float.
    pub fn from_raw_f64(value: f64) -> Self {
        let mut result = Fixed64::ZERO;
        decompose(value.abs(), 62, |bit| result.flip_bit(bit));
        if value < 0.0 {
            sub64(Fixed64::ZERO, result)
        } else {
            result
        }
    }

    /// Build a value from a real float; the fraction is truncated to 1/16.
    pub fn from_f64(value: f64) -> Self {
        Self::from_raw_f64(value * FRACTION_SCALE)
    }

    /// The raw integer as a float.
    pub fn to_raw_f64(self) -> f64 {
        self.hi as f64 * 4_294_967_296.0 + (self.lo as u32) as f64
    }

    /// The real value (`raw / 16`) as a float.
    pub fn to_f64(self) -> f64 {
        self.to_raw_f64() / FRACTION_SCALE
    }

    /// Reinterpret the two limbs as a native 64-bit pattern.
    pub fn to_bits(self) -> u64 {
        ((self.hi as u32 as u64) << 32) | (self.lo as u32 as u64)
    }

    pub fn from_bits(bits: u64) -> Self {
        Fixed64 {
            lo: bits as u32 as i32,
            hi: (bits >> 32) as u32 as i32,
        }
    }

    /// The integral tick, clamped to `[0, u32::MAX]`.
    pub fn to_tick_saturating(self) -> u32 {
        if self.is_negative() {
            return 0;
        }
        if self.hi > 0xF {
            return u32::MAX;
        }
        ((self.lo as u32) >> 4) | ((self.hi as u32) << 28)
    }
}

/// Load a 32-bit tick into the left-shifted fixed-point representation.
pub fn load_tick_left_shift4(tick: u32) -> Fixed64 {
    let raw = tick as i32;
    Fixed64 {
        lo: raw << 4,
        hi: top_nibble(raw),
    }
}

/// Limb-wise addition with the carry propagated into the high limb.
pub fn add64(a: Fixed64, b: Fixed64) -> Fixed64 {
    let lo = a.lo.wrapping_add(b.lo);
    let carry = carry_flag(a.lo, b.lo, lo);
    let hi = a.hi.wrapping_add(b.hi).wrapping_add(carry);
    Fixed64 { lo, hi }
}

/// Limb-wise subtraction with the borrow propagated into the high limb.
pub fn sub64(a: Fixed64, b: Fixed64) -> Fixed64 {
    let lo = a.lo.wrapping_sub(b.lo);
    let borrow = borrow_flag(a.lo, b.lo, lo);
    let hi = a.hi.wrapping_sub(b.hi).wrapping_sub(borrow);
    Fixed64 { lo, hi }
}

/// Multiply the raw value by a float, summing 16-bit chunks so that large
/// magnitudes keep their leading bits.
pub fn mul_float64(a: Fixed64, b: f32) -> f32 {
    let negative = a.is_negative();
    let a = if negative { sub64(Fixed64::ZERO, a) } else { a };

    let a0 = low_chunk(a.lo);
    let a1 = high_chunk(a.lo);
    let a2 = low_chunk(a.hi);
    let a3 = high_chunk(a.hi);
    let shift_32 = SHIFT_16 * SHIFT_16;
    let shift_48 = shift_32 * SHIFT_16;

    let mut result = a0 * b;
    result += a1 * b * SHIFT_16;
    result += a2 * b * shift_32;
    result += a3 * b * shift_48;
    if negative {
        result *= -1.0;
    }
    result
}

impl Add for Fixed64 {
    type Output = Fixed64;

    fn add(self, rhs: Fixed64) -> Fixed64 {
        add64(self, rhs)
    }
}

impl Sub for Fixed64 {
    type Output = Fixed64;

    fn sub(self, rhs: Fixed64) -> Fixed64 {
        sub64(self, rhs)
    }
}

impl Neg for Fixed64 {
    type Output = Fixed64;

    fn neg(self) -> Fixed64 {
        sub64(Fixed64::ZERO, self)
    }
}

impl fmt::LowerHex for Fixed64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}{:08x}", self.hi as u32, self.lo as u32)
    }
}

impl fmt::Display for Fixed64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self)
    }
}
