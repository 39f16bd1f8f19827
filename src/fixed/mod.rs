//! Extended-precision fixed-point arithmetic
//!
//! The heap diagram has to address the full 64-bit address space with sub-
//! integer precision, and the projection into display space has to be
//! reproducible by a vertex shader that only has 32-bit integers and 32-bit
//! floats. Both coordinate axes are therefore stored as multi-limb
//! two's-complement integers whose lowest 4 bits are a fractional component:
//!
//! - [`Fixed64`]: two 32-bit limbs, used for the tick axis
//! - [`Fixed96`]: three 32-bit limbs, used for the address axis
//!
//! Every operation in this module is written with 32-bit limb operations only
//! (bitwise ops, wrapping add/sub, compares and shifts). A 64-bit native type
//! only appears at the boundary conversions (`from_bits`, `to_bits`,
//! `to_address_saturating`) that feed host-side callers.
//!
//! # Value model
//!
//! ```text
//! real value = raw integer / 16
//! ```
//!
//! "Raw" helpers (`from_raw_f64`, `to_raw_f64`) work on the raw integer, the
//! plain helpers (`from_f64`, `to_f64`) on the real value.
//!
//! # Precision
//!
//! `f64` stands in for the extended float of the conversions. Values above
//! 2^53 raw units lose their lowest bits when they pass through a float; this
//! only affects pan/zoom deltas, never the stored bounds themselves.

pub mod fixed64;
pub mod fixed96;

pub use fixed64::{add64, load_tick_left_shift4, mul_float64, sub64, Fixed64};
pub use fixed96::{add96, load_address_left_shift4, mul_float96, sub96, Fixed96};

/// Number of fractional bits in both fixed-point widths.
pub const FRACTION_BITS: u32 = 4;

/// Scale between raw and real values (`2^FRACTION_BITS`).
pub const FRACTION_SCALE: f64 = 16.0;

const SHIFT_16: f32 = 65536.0;

/// Carry-out of `a + b` given the wrapped 32-bit `sum`, as 0 or 1.
///
/// The carry lives in the top bit of `(a & b) | ((a | b) & !sum)`.
#[inline]
fn carry_flag(a: i32, b: i32, sum: i32) -> i32 {
    let carry = (a & b) | ((a | b) & !sum);
    if carry < 0 {
        1
    } else {
        0
    }
}

/// Borrow-out of `a - b` given the wrapped 32-bit `difference`, as 0 or 1.
#[inline]
fn borrow_flag(a: i32, b: i32, difference: i32) -> i32 {
    let borrow = (!a & b) | (!(a ^ b) & difference);
    if borrow < 0 {
        1
    } else {
        0
    }
}

/// The top 4 bits of a limb, moved down to bits 0..4.
#[inline]
pub fn top_nibble(value: i32) -> i32 {
    (value >> 28) & 0xF
}

/// Low 16 bits of a limb as a float.
#[inline]
fn low_chunk(limb: i32) -> f32 {
    (limb & 0xFFFF) as f32
}

/// High 16 bits of a limb as a float.
#[inline]
fn high_chunk(limb: i32) -> f32 {
    ((limb >> 16) & 0xFFFF) as f32
}

/// Greedy binary decomposition of a non-negative float.
///
/// Calls `set_bit` for every power of two taken, scanning down from the
/// highest set bit. The scan never starts above `max_bit`, so inputs beyond
/// the representable range saturate to all ones below `max_bit`.
fn decompose(mut absolute: f64, max_bit: u32, mut set_bit: impl FnMut(u32)) {
    if !(absolute >= 1.0) {
        return;
    }
    let mut highest = (absolute.log2().floor() as u32).min(max_bit);
    if highest < max_bit && 2f64.powi(highest as i32 + 1) <= absolute {
        highest += 1;
    }
    for bit in (0..=highest).rev() {
        let power = 2f64.powi(bit as i32);
        if absolute >= power {
            absolute -= power;
            set_bit(bit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_flag() {
        assert_eq!(carry_flag(-1, 1, 0), 1);
        assert_eq!(carry_flag(1, 1, 2), 0);
        // 0x80000000 + 0x80000000 wraps to 0 with a carry.
        assert_eq!(carry_flag(i32::MIN, i32::MIN, 0), 1);
        assert_eq!(carry_flag(0x7FFF_FFFF, 1, i32::MIN), 0);
    }

    #[test]
    fn test_borrow_flag() {
        assert_eq!(borrow_flag(0, 1, -1), 1);
        assert_eq!(borrow_flag(5, 3, 2), 0);
        // 0x7FFFFFFF - 0xFFFFFFFF needs a borrow in unsigned terms.
        assert_eq!(borrow_flag(0x7FFF_FFFF, -1, i32::MIN), 1);
        assert_eq!(borrow_flag(-1, 0x7FFF_FFFF, i32::MIN), 0);
    }

    #[test]
    fn test_top_nibble() {
        assert_eq!(top_nibble(0x1234_5678), 0x1);
        assert_eq!(top_nibble(-1), 0xF);
        assert_eq!(top_nibble(0x0FFF_FFFF), 0);
    }

    #[test]
    fn test_decompose_saturates() {
        let mut bits = Vec::new();
        decompose(1e30, 6, |b| bits.push(b));
        assert_eq!(bits, vec![6, 5, 4, 3, 2, 1, 0]);

        bits.clear();
        decompose(0.75, 62, |b| bits.push(b));
        assert!(bits.is_empty());

        bits.clear();
        decompose(f64::NAN, 62, |b| bits.push(b));
        assert!(bits.is_empty());
    }
}
