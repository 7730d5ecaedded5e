//! Base/display unit handling (`rao`/`tao`), grounded on
//! `examples/original_source/bittensor/utils/balance.py`: one `tao` is
//! `10^9` `rao`, all on-chain arithmetic happens in `rao`, and float
//! conversion only ever happens at display/parse boundaries.

use std::fmt;
use std::ops::{Add, Sub};

/// Number of `rao` in one `tao`.
pub const RAO_PER_TAO: u64 = 1_000_000_000;

/// A balance expressed in base units (`rao`).
///
/// Invariant (spec §8): `Balance::from_rao(b.rao()).rao() == b.rao()` for
/// every `b`, and `Balance::from_tao(b.tao()).rao() == b.rao()` within ±1
/// `rao` (float rounding).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Balance(u64);

impl Balance {
    /// The zero balance.
    pub const ZERO: Balance = Balance(0);

    /// Construct a balance from an exact `rao` amount.
    pub const fn from_rao(rao: u64) -> Self {
        Balance(rao)
    }

    /// Construct a balance from a `tao` amount, rounding to the nearest `rao`.
    ///
    /// The parser half of this (bare numbers: float => tao, integer => rao)
    /// lives at the call site / facade boundary, not here - this type only
    /// ever holds `rao`.
    pub fn from_tao(tao: f64) -> Self {
        Balance((tao * RAO_PER_TAO as f64).round() as u64)
    }

    /// The raw `rao` amount.
    pub const fn rao(&self) -> u64 {
        self.0
    }

    /// The `tao` amount as a float, for display purposes only.
    pub fn tao(&self) -> f64 {
        self.0 as f64 / RAO_PER_TAO as f64
    }
}

impl fmt::Display for Balance {
    /// Emits `τX.XXXXXXXXX`, as specified in §6.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{03c4}{:.9}", self.tao())
    }
}

impl Add for Balance {
    type Output = Balance;
    fn add(self, rhs: Balance) -> Balance {
        Balance(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Balance {
    type Output = Balance;
    fn sub(self, rhs: Balance) -> Balance {
        Balance(self.0.saturating_sub(rhs.0))
    }
}

impl codec::Encode for Balance {
    fn encode_to<T: codec::Output + ?Sized>(&self, dest: &mut T) {
        self.0.encode_to(dest)
    }
}

impl codec::Decode for Balance {
    fn decode<I: codec::Input>(input: &mut I) -> Result<Self, codec::Error> {
        u64::decode(input).map(Balance)
    }
}

/// A 128-bit fixed-point value (`U64F64`): 64 integer bits, 64 fractional
/// bits, as specified in §3/§9. This is display-only; it is never used in
/// on-chain arithmetic within this crate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, codec::Encode, codec::Decode)]
pub struct FixedU64F64(pub u128);

impl FixedU64F64 {
    /// Build from the raw 128-bit representation.
    pub const fn from_bits(bits: u128) -> Self {
        FixedU64F64(bits)
    }

    /// Integer half of the fixed-point value.
    pub const fn int_part(&self) -> u64 {
        (self.0 >> 64) as u64
    }

    /// Fractional half of the fixed-point value.
    pub const fn frac_part(&self) -> u64 {
        self.0 as u64
    }

    /// Convert to `f64` for display: `int_part + frac_part / 2^64`.
    pub fn to_f64(&self) -> f64 {
        self.int_part() as f64 + (self.frac_part() as f64 / (u64::MAX as f64 + 1.0))
    }
}

impl fmt::Display for FixedU64F64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rao_round_trips() {
        for rao in [0u64, 1, 999, 1_000_000_000, 21_000_000 * RAO_PER_TAO] {
            let b = Balance::from_rao(rao);
            assert_eq!(Balance::from_rao(b.rao()).rao(), b.rao());
        }
    }

    #[test]
    fn tao_round_trips_within_a_rao() {
        let b = Balance::from_rao(1_500_000_000);
        let back = Balance::from_tao(b.tao());
        assert!((back.rao() as i64 - b.rao() as i64).abs() <= 1);
    }

    #[test]
    fn display_format() {
        let b = Balance::from_rao(1_500_000_000);
        assert_eq!(format!("{b}"), "\u{03c4}1.500000000");
    }

    #[test]
    fn fixed_point_display() {
        let f = FixedU64F64::from_bits((5u128 << 64) | (1u128 << 63));
        assert!((f.to_f64() - 5.5).abs() < 1e-9);
    }
}
