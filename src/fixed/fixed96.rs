//! 96-bit fixed-point values built from three 32-bit limbs

use super::fixed64::{add64, sub64, Fixed64};
use super::{decompose, high_chunk, low_chunk, top_nibble, FRACTION_SCALE, SHIFT_16};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A 96-bit two's-complement integer split into three 32-bit limbs.
///
/// A left-shifted 64-bit address occupies 68 bits, so the top limb only ever
/// holds the address's top nibble plus sign and pan headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fixed96 {
    pub lo: i32,
    pub mid: i32,
    pub hi: i32,
}

impl Fixed96 {
    pub const ZERO: Fixed96 = Fixed96 {
        lo: 0,
        mid: 0,
        hi: 0,
    };

    pub const fn new(lo: i32, mid: i32, hi: i32) -> Self {
        Fixed96 { lo, mid, hi }
    }

    pub fn is_negative(self) -> bool {
        self.hi < 0
    }

    /// Toggle bit `index` (0..96) of the raw value.
    pub fn flip_bit(&mut self, index: u32) {
        if index >= 64 {
            self.hi ^= 1 << (index - 64);
        } else if index >= 32 {
            self.mid ^= 1 << (index - 32);
        } else {
            self.lo ^= 1 << index;
        }
    }

    pub fn from_raw_f64(value: f64) -> Self {
        let mut result = Fixed96::ZERO;
        decompose(value.abs(), 94, |bit| result.flip_bit(bit));
        if value < 0.0 {
            sub96(Fixed96::ZERO, result)
        } else {
            result
        }
    }

    pub fn from_f64(value: f64) -> Self {
        Self::from_raw_f64(value * FRACTION_SCALE)
    }

    pub fn to_raw_f64(self) -> f64 {
        let shift_32 = 4_294_967_296.0;
        let mut result = self.hi as f64;
        result = result * shift_32 + (self.mid as u32) as f64;
        result * shift_32 + (self.lo as u32) as f64
    }

    pub fn to_f64(self) -> f64 {
        self.to_raw_f64() / FRACTION_SCALE
    }

    /// The two low limbs as one native 64-bit pattern.
    pub fn low_bits(self) -> u64 {
        ((self.mid as u32 as u64) << 32) | (self.lo as u32 as u64)
    }

    /// The top limb reinterpreted as unsigned.
    pub fn upper_bits(self) -> u32 {
        self.hi as u32
    }

    /// The integral address, clamped to `[0, u64::MAX]`.
    pub fn to_address_saturating(self) -> u64 {
        if self.is_negative() {
            return 0;
        }
        if self.hi > 0xF {
            return u64::MAX;
        }
        let low = ((self.lo as u32) >> 4) | ((self.mid as u32) << 28);
        let high = ((self.mid as u32) >> 4) | ((self.hi as u32) << 28);
        ((high as u64) << 32) | low as u64
    }
}

/// Load a 64-bit address, given as its two 32-bit halves, into the
/// left-shifted fixed-point representation.
pub fn load_address_left_shift4(low: u32, high: u32) -> Fixed96 {
    let low = low as i32;
    let high = high as i32;
    Fixed96 {
        lo: low << 4,
        mid: (high << 4) | top_nibble(low),
        hi: top_nibble(high),
    }
}

/// Two chained 64-bit additions; carry-out of the top limb is dropped.
pub fn add96(a: Fixed96, b: Fixed96) -> Fixed96 {
    let low = add64(Fixed64::new(a.lo, 0), Fixed64::new(b.lo, 0));
    // low.hi is the carry out of the first limb.
    let middle = add64(
        add64(Fixed64::new(a.mid, 0), Fixed64::new(b.mid, 0)),
        Fixed64::new(low.hi, 0),
    );
    let hi = a.hi.wrapping_add(b.hi).wrapping_add(middle.hi);
    Fixed96 {
        lo: low.lo,
        mid: middle.lo,
        hi,
    }
}

/// Two chained 64-bit subtractions; borrow-out of the top limb is dropped.
pub fn sub96(a: Fixed96, b: Fixed96) -> Fixed96 {
    let low = sub64(Fixed64::new(a.lo, 0), Fixed64::new(b.lo, 0));
    // low.hi is 0 or -1; negate it to get the borrow.
    let middle = sub64(
        sub64(Fixed64::new(a.mid, 0), Fixed64::new(b.mid, 0)),
        Fixed64::new(low.hi.wrapping_neg(), 0),
    );
    let hi = a
        .hi
        .wrapping_sub(b.hi)
        .wrapping_sub(middle.hi.wrapping_neg());
    Fixed96 {
        lo: low.lo,
        mid: middle.lo,
        hi,
    }
}

pub fn mul_float96(a: Fixed96, b: f32) -> f32 {
    let negative = a.is_negative();
    let a = if negative { sub96(Fixed96::ZERO, a) } else { a };

    let a0 = low_chunk(a.lo);
    let a1 = high_chunk(a.lo);
    let a2 = low_chunk(a.mid);
    let a3 = high_chunk(a.mid);
    let a4 = low_chunk(a.hi);
    let a5 = high_chunk(a.hi);
    let shift_32 = SHIFT_16 * SHIFT_16;
    let shift_48 = shift_32 * SHIFT_16;
    let shift_64 = shift_48 * SHIFT_16;
    let shift_80 = shift_64 * SHIFT_16;

    let mut result = a0 * b;
    result += a1 * b * SHIFT_16;
    result += a2 * b * shift_32;
    result += a3 * b * shift_48;
    result += a4 * b * shift_64;
    result += a5 * b * shift_80;
    if negative {
        result *= -1.0;
    }
    result
}

impl Add for Fixed96 {
    type Output = Fixed96;

    fn add(self, rhs: Fixed96) -> Fixed96 {
        add96(self, rhs)
    }
}

impl Sub for Fixed96 {
    type Output = Fixed96;

    fn sub(self, rhs: Fixed96) -> Fixed96 {
        sub96(self, rhs)
    }
}

impl Neg for Fixed96 {
    type Output = Fixed96;

    fn neg(self) -> Fixed96 {
        sub96(Fixed96::ZERO, self)
    }
}

impl fmt::LowerHex for Fixed96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}{:08x}{:08x}",
            self.hi as u32, self.mid as u32, self.lo as u32
        )
    }
}

impl fmt::Display for Fixed96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_crosses_both_limbs() {
        let a = Fixed96::new(-1, -1, 0);
        let one = Fixed96::new(1, 0, 0);
        assert_eq!(add96(a, one), Fixed96::new(0, 0, 1));
        assert_eq!(sub96(Fixed96::new(0, 0, 1), one), a);
    }

    #[test]
    fn test_negation() {
        let one = Fixed96::new(1, 0, 0);
        assert_eq!(-one, Fixed96::new(-1, -1, -1));
        assert_eq!(-(-one), one);
        assert!((-one).is_negative());
    }

    #[test]
    fn test_load_full_address() {
        let max = load_address_left_shift4(0xFFFF_FFFF, 0xFFFF_FFFF);
        assert_eq!(max, Fixed96::new(0xFFFF_FFF0_u32 as i32, -1, 0xF));
        assert_eq!(max.to_address_saturating(), u64::MAX);

        let mid = load_address_left_shift4(0x8765_4321, 0x1234_5678);
        assert_eq!(mid.to_address_saturating(), 0x1234_5678_8765_4321);
    }

    #[test]
    fn test_address_saturation() {
        assert_eq!(Fixed96::new(0, 0, -1).to_address_saturating(), 0);
        assert_eq!(Fixed96::new(0, 0, 0x10).to_address_saturating(), u64::MAX);
    }

    #[test]
    fn test_mul_float_uses_top_limb() {
        let value = Fixed96::new(0, 0, 1);
        let expected = 2f32.powi(64) * 0.25;
        assert_eq!(mul_float96(value, 0.25), expected);
        assert_eq!(mul_float96(-value, 0.25), -expected);
    }

    #[test]
    fn test_raw_float_round_trip() {
        let raw = 3.0 * 2f64.powi(66) + 2f64.powi(20);
        let value = Fixed96::from_raw_f64(raw);
        assert_eq!(value, Fixed96::new(0x10_0000, 0, 12));
        assert_eq!(value.to_raw_f64(), raw);
    }
}
