//! Binary symbols.
//!
//! This module contains the struct [Bit], which represents a single
//! transmitted or received bit.

use core::ops::{Add, AddAssign, Mul, MulAssign, Not};
use num_traits::{One, Zero};

/// Single bit.
///
/// This struct represents a bit taking the value 0 or 1. Addition of bits is
/// defined as XOR, so `a + b` is one exactly when the two bits differ, and
/// multiplication is defined as AND. Negation flips the bit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Bit(u8);

impl Zero for Bit {
    fn zero() -> Bit {
        Bit(0)
    }

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn set_zero(&mut self) {
        *self = Self::zero()
    }
}

impl One for Bit {
    fn one() -> Bit {
        Bit(1)
    }

    fn set_one(&mut self) {
        *self = Self::one()
    }

    fn is_one(&self) -> bool {
        *self == Self::one()
    }
}

impl Add for Bit {
    type Output = Bit;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Bit) -> Bit {
        Bit(self.0 ^ rhs.0)
    }
}

impl Mul for Bit {
    type Output = Bit;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn mul(self, rhs: Bit) -> Bit {
        Bit(self.0 & rhs.0)
    }
}

impl Not for Bit {
    type Output = Bit;

    fn not(self) -> Bit {
        Bit(self.0 ^ 1)
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Bit {
        Bit(u8::from(value))
    }
}

impl From<Bit> for u8 {
    fn from(value: Bit) -> u8 {
        value.0
    }
}

impl From<Bit> for bool {
    fn from(value: Bit) -> bool {
        value.0 == 1
    }
}

impl std::fmt::Display for Bit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.0)
    }
}

macro_rules! impl_ops {
    ($op:ident, $opmethod:ident, $opassign:ident, $opassign_method:ident) => {
        impl $op<&Bit> for Bit {
            type Output = Bit;
            fn $opmethod(self, rhs: &Bit) -> Bit {
                self.$opmethod(*rhs)
            }
        }

        impl $opassign for Bit {
            fn $opassign_method(&mut self, rhs: Bit) {
                *self = self.$opmethod(rhs);
            }
        }

        impl $opassign<&Bit> for Bit {
            fn $opassign_method(&mut self, rhs: &Bit) {
                *self = self.$opmethod(*rhs);
            }
        }
    };
}

impl_ops!(Add, add, AddAssign, add_assign);
impl_ops!(Mul, mul, MulAssign, mul_assign);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ops() {
        assert_eq!(Bit::zero() + Bit::zero(), Bit::zero());
        assert_eq!(Bit::zero() + Bit::one(), Bit::one());
        assert_eq!(Bit::one() + Bit::zero(), Bit::one());
        assert_eq!(Bit::one() + Bit::one(), Bit::zero());
        assert_eq!(Bit::zero() * Bit::zero(), Bit::zero());
        assert_eq!(Bit::zero() * Bit::one(), Bit::zero());
        assert_eq!(Bit::one() * Bit::one(), Bit::one());
    }

    #[test]
    fn not() {
        assert_eq!(!Bit::zero(), Bit::one());
        assert_eq!(!Bit::one(), Bit::zero());
    }

    #[test]
    fn conversions() {
        assert_eq!(Bit::from(true), Bit::one());
        assert_eq!(Bit::from(false), Bit::zero());
        assert_eq!(u8::from(Bit::one()), 1);
        assert_eq!(u8::from(Bit::zero()), 0);
        assert!(bool::from(Bit::one()));
        assert!(!bool::from(Bit::zero()));
    }

    #[test]
    fn display() {
        assert_eq!(Bit::zero().to_string(), "0");
        assert_eq!(Bit::one().to_string(), "1");
    }
}
