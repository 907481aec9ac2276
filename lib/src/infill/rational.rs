//! Exact rational y positions of scan-line intersections.
//!
//! A position is stored as `p / q` with a signed 64-bit numerator and a
//! positive 32-bit denominator. Two positions are compared by cross
//! multiplication split into 32-bit limbs, so no 128-bit arithmetic is needed
//! and the result is exact.

use crate::Coord;
use std::cmp::Ordering;
use std::fmt;

/// A y coordinate `p / q` with `q > 0`.
#[derive(Clone, Copy)]
pub struct RationalY {
    p: i64,
    q: u32,
}

impl RationalY {
    /// Build `p / q`. Returns `None` if `q` is zero.
    #[inline]
    pub fn new(p: i64, q: u32) -> Option<Self> {
        (q > 0).then_some(Self { p, q })
    }

    /// An integer position.
    #[inline]
    pub const fn from_int(y: Coord) -> Self {
        Self { p: y, q: 1 }
    }

    #[inline]
    pub fn numerator(&self) -> i64 {
        self.p
    }

    #[inline]
    pub fn denominator(&self) -> u32 {
        self.q
    }

    /// The denominator is one, the position lies exactly on the grid.
    #[inline]
    pub fn is_integer(&self) -> bool {
        self.q == 1
    }

    /// Round half away from zero to the nearest integer coordinate.
    #[inline]
    pub fn round(&self) -> Coord {
        let half = (self.q >> 1) as i64;
        let p = if self.p < 0 { self.p - half } else { self.p + half };
        p / self.q as i64
    }

    pub fn to_f64(&self) -> f64 {
        self.p as f64 / self.q as f64
    }

    /// Split `|p| * q` into a high part (bits 32 and up) and the low 32 bits.
    #[inline]
    fn limbs(p_abs: u64, q: u32) -> (u64, u64) {
        let q = q as u64;
        let lo = (p_abs & 0xffff_ffff) * q;
        let hi = (p_abs >> 32) * q + (lo >> 32);
        (hi, lo & 0xffff_ffff)
    }
}

impl Ord for RationalY {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.p == 0 || other.p == 0 {
            return self.p.cmp(&other.p);
        }
        let negative = self.p < 0;
        if negative != (other.p < 0) {
            return if negative { Ordering::Less } else { Ordering::Greater };
        }
        // Same sign: compare |p1| * q2 against |p2| * q1.
        let l = Self::limbs(self.p.unsigned_abs(), other.q);
        let r = Self::limbs(other.p.unsigned_abs(), self.q);
        let ord = l.cmp(&r);
        if negative {
            ord.reverse()
        } else {
            ord
        }
    }
}

impl PartialOrd for RationalY {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RationalY {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RationalY {}

impl fmt::Debug for RationalY {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.q == 1 {
            write!(f, "{}", self.p)
        } else {
            write!(f, "{}/{}", self.p, self.q)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(p: i64, q: u32) -> RationalY {
        RationalY::new(p, q).unwrap()
    }

    #[test]
    fn test_rational_zero_denominator() {
        assert!(RationalY::new(1, 0).is_none());
    }

    #[test]
    fn test_rational_compare_signs() {
        assert!(r(-1, 7) < r(0, 3));
        assert!(r(0, 3) < r(1, 1_000_000));
        assert!(r(-5, 2) < r(3, 4));
        assert!(r(3, 4) > r(-5, 2));
        assert_eq!(r(0, 1), r(0, 9));
    }

    #[test]
    fn test_rational_equal_different_denominators() {
        assert_eq!(r(6, 4), r(3, 2));
        assert_eq!(r(-6, 4), r(-3, 2));
        assert_eq!(r(1, 3).cmp(&r(2, 6)), Ordering::Equal);
        assert!(r(1, 3) < r(1, 2));
        assert!(r(-1, 3) > r(-1, 2));
    }

    #[test]
    fn test_rational_large_numerators() {
        // Products overflow 64 bits; the limb split keeps them exact.
        let big = 1_i64 << 60;
        let a = r(big, u32::MAX);
        let b = r(big + 1, u32::MAX);
        assert!(a < b);
        assert!(r(-big, u32::MAX) > r(-big - 1, u32::MAX));
        assert_eq!(r(big, 2), r(big / 2, 1));

        // Differs only in the low limb.
        let c = r(0x1_0000_0001, 3);
        let d = r(0x1_0000_0002, 3);
        assert!(c < d);
    }

    #[test]
    fn test_rational_sort_is_total() {
        let mut v = vec![r(7, 3), r(-1, 2), r(2, 1), r(0, 5), r(14, 6), r(-3, 7)];
        v.sort();
        let f: Vec<f64> = v.iter().map(|x| x.to_f64()).collect();
        for w in f.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn test_rational_round() {
        assert_eq!(r(7, 2).round(), 4);
        assert_eq!(r(-7, 2).round(), -4);
        assert_eq!(r(10, 3).round(), 3);
        assert_eq!(r(-10, 3).round(), -3);
        assert_eq!(RationalY::from_int(42).round(), 42);
        assert!(RationalY::from_int(42).is_integer());
    }
}
