//! Microsoft Binary Format floating point.
//!
//! Both widths keep an 8-bit exponent biased by 128, the sign as the top
//! bit of the first mantissa byte, and an implied leading one. Exponent
//! zero is zero; there are no subnormals, infinities or NaNs. Values are
//! held as a single word laid out `exponent | sign | mantissa` so that
//! the written byte order `{exp, sign|m, m, m}` is simply big-endian.
//! The legacy memory image (and the token stream) uses the reversed,
//! little-endian order.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Mbf32(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Mbf64(u64);

const MANT32: u32 = (1 << 23) - 1;
const MANT64: u64 = (1 << 55) - 1;

impl Mbf32 {
    pub const ZERO: Mbf32 = Mbf32(0);
    pub const MAX: Mbf32 = Mbf32(0xFF7F_FFFF);

    pub fn from_bits(bits: u32) -> Mbf32 {
        Mbf32(bits)
    }

    pub fn to_bits(self) -> u32 {
        self.0
    }

    /// Bytes in written order: exponent first.
    pub fn from_bytes(bytes: [u8; 4]) -> Mbf32 {
        Mbf32(u32::from_be_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Bytes in memory order: exponent last.
    pub fn from_le_bytes(bytes: [u8; 4]) -> Mbf32 {
        Mbf32(u32::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn exponent(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn is_zero(self) -> bool {
        self.exponent() == 0
    }

    pub fn is_negative(self) -> bool {
        !self.is_zero() && self.0 & 0x0080_0000 != 0
    }

    fn clamp(negative: bool) -> Mbf32 {
        if negative {
            Mbf32(Mbf32::MAX.0 | 0x0080_0000)
        } else {
            Mbf32::MAX
        }
    }

    pub fn from_f32(value: f32) -> Mbf32 {
        let bits = value.to_bits();
        let negative = bits >> 31 != 0;
        if !value.is_finite() {
            return Mbf32::clamp(negative);
        }
        let exp = (bits >> 23) & 0xFF;
        if exp == 0 {
            return Mbf32::ZERO;
        }
        let exp = exp + 2;
        if exp > 0xFF {
            return Mbf32::clamp(negative);
        }
        Mbf32(exp << 24 | (negative as u32) << 23 | bits & MANT32)
    }

    pub fn to_f32(self) -> f32 {
        if self.is_zero() {
            return 0.0;
        }
        let exp = self.exponent() as i32 - 2;
        let sign = (self.is_negative() as u32) << 31;
        let mant = self.0 & MANT32;
        if exp >= 1 {
            f32::from_bits(sign | (exp as u32) << 23 | mant)
        } else {
            // Lands in IEEE subnormal range; let the FPU do the rounding.
            let magnitude =
                (1.0 + mant as f64 / (1u64 << 23) as f64) * 2f64.powi(self.exponent() as i32 - 129);
            let v = magnitude as f32;
            if sign != 0 {
                -v
            } else {
                v
            }
        }
    }

    pub fn to_mbf64(self) -> Mbf64 {
        Mbf64((self.0 as u64 & 0xFF80_0000) << 32 | ((self.0 & MANT32) as u64) << 32)
    }
}

impl Mbf64 {
    pub const ZERO: Mbf64 = Mbf64(0);
    pub const MAX: Mbf64 = Mbf64(0xFF7F_FFFF_FFFF_FFFF);

    pub fn from_bits(bits: u64) -> Mbf64 {
        Mbf64(bits)
    }

    pub fn to_bits(self) -> u64 {
        self.0
    }

    pub fn from_bytes(bytes: [u8; 8]) -> Mbf64 {
        Mbf64(u64::from_be_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Mbf64 {
        Mbf64(u64::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn exponent(self) -> u8 {
        (self.0 >> 56) as u8
    }

    pub fn is_zero(self) -> bool {
        self.exponent() == 0
    }

    pub fn is_negative(self) -> bool {
        !self.is_zero() && self.0 & (1 << 55) != 0
    }

    fn clamp(negative: bool) -> Mbf64 {
        if negative {
            Mbf64(Mbf64::MAX.0 | 1 << 55)
        } else {
            Mbf64::MAX
        }
    }

    pub fn from_f64(value: f64) -> Mbf64 {
        let bits = value.to_bits();
        let negative = bits >> 63 != 0;
        if !value.is_finite() {
            return Mbf64::clamp(negative);
        }
        let exp = ((bits >> 52) & 0x7FF) as i64;
        if exp == 0 {
            return Mbf64::ZERO;
        }
        let exp = exp - 894;
        if exp <= 0 {
            return Mbf64::ZERO;
        }
        if exp > 0xFF {
            return Mbf64::clamp(negative);
        }
        let mant = (bits & ((1 << 52) - 1)) << 3;
        Mbf64((exp as u64) << 56 | (negative as u64) << 55 | mant)
    }

    pub fn to_f64(self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let mut exp = self.exponent() as u64 + 894;
        let mant55 = self.0 & MANT64;
        let mut mant = mant55 >> 3;
        let dropped = mant55 & 0b111;
        if dropped > 0b100 || (dropped == 0b100 && mant & 1 == 1) {
            mant += 1;
            if mant == 1 << 52 {
                mant = 0;
                exp += 1;
            }
        }
        let sign = (self.is_negative() as u64) << 63;
        f64::from_bits(sign | exp << 52 | mant)
    }

    /// Narrow to single precision, rounding the low 32 mantissa bits to
    /// nearest with ties to even.
    pub fn to_mbf32(self) -> Mbf32 {
        if self.is_zero() {
            return Mbf32::ZERO;
        }
        let negative = self.is_negative();
        let mut exp = self.exponent() as u32;
        let mant55 = self.0 & MANT64;
        let mut mant = (mant55 >> 32) as u32;
        let low = mant55 as u32;
        const HALF: u32 = 1 << 31;
        if low > HALF || (low == HALF && mant & 1 == 1) {
            mant += 1;
            if mant > MANT32 {
                mant = 0;
                exp += 1;
                if exp > 0xFF {
                    return Mbf32::clamp(negative);
                }
            }
        }
        Mbf32(exp << 24 | (negative as u32) << 23 | mant)
    }
}

impl From<f32> for Mbf32 {
    fn from(v: f32) -> Mbf32 {
        Mbf32::from_f32(v)
    }
}

impl From<Mbf32> for f32 {
    fn from(m: Mbf32) -> f32 {
        m.to_f32()
    }
}

impl From<f64> for Mbf64 {
    fn from(v: f64) -> Mbf64 {
        Mbf64::from_f64(v)
    }
}

impl From<Mbf64> for f64 {
    fn from(m: Mbf64) -> f64 {
        m.to_f64()
    }
}

/// Largest magnitude either MBF width can hold, as a host double.
pub fn max_magnitude() -> f64 {
    Mbf64::MAX.to_f64()
}

/// Smallest non-zero magnitude; anything below flushes to zero.
pub fn min_magnitude() -> f64 {
    2f64.powi(-128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn test_pi_bytes() {
        let m = Mbf32::from_bytes([0x82, 0x49, 0x0F, 0xDA]);
        let v = m.to_f32();
        assert!((v - std::f32::consts::PI).abs() < 1e-6);
        assert_eq!(Mbf32::from_f32(v), m);
        assert_eq!(m.to_le_bytes(), [0xDA, 0x0F, 0x49, 0x82]);
    }

    #[test]
    fn test_zero_and_sign() {
        assert!(Mbf32::from_f32(0.0).is_zero());
        assert!(Mbf32::from_f32(-0.0).is_zero());
        assert_eq!(Mbf32::from_f32(-1.0).to_bytes(), [0x81, 0x80, 0x00, 0x00]);
        assert_eq!(Mbf32::from_f32(1.0).to_bytes(), [0x81, 0x00, 0x00, 0x00]);
        assert_eq!(Mbf32::from_f32(0.5).to_f32(), 0.5);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(Mbf32::from_f32(f32::INFINITY), Mbf32::MAX);
        assert!(Mbf32::from_f32(f32::NEG_INFINITY).is_negative());
        assert_eq!(Mbf32::from_f32(f32::NAN).exponent(), 0xFF);
        assert_eq!(Mbf32::from_f32(3.0e38), Mbf32::MAX);
        assert!(Mbf32::from_f32(1.0e-45).is_zero());
        assert!(Mbf64::from_f64(1.0e-300).is_zero());
        assert_eq!(Mbf64::from_f64(1.0e300), Mbf64::MAX);
    }

    #[test]
    fn test_narrowing_rounds_to_even() {
        let one = Mbf64::from_f64(1.0);
        let half_ulp = Mbf64::from_bits(one.to_bits() | 1 << 31);
        assert_eq!(half_ulp.to_mbf32(), Mbf32::from_f32(1.0));
        let odd = Mbf64::from_bits(one.to_bits() | 1 << 32 | 1 << 31);
        assert_eq!(odd.to_mbf32().to_bits() & 0x7FFFFF, 2);
        let above = Mbf64::from_bits(one.to_bits() | 1 << 31 | 1);
        assert_eq!(above.to_mbf32().to_bits() & 0x7FFFFF, 1);
        let carry = Mbf64::from_bits(0x81FF_FFFF_FFFF_FFFF & !(1 << 55));
        assert_eq!(carry.to_mbf32().exponent(), 0x82);
        assert_eq!(Mbf64::from_f64(0.1).to_mbf32(), Mbf32::from_f32(0.1));
    }

    #[test]
    fn test_widen_narrow() {
        let m = Mbf32::from_f32(-123.456);
        assert_eq!(m.to_mbf64().to_mbf32(), m);
        assert_eq!(m.to_mbf64().to_f64(), -123.456f32 as f64);
    }

    #[test]
    fn test_f32_round_trip_property() {
        fn prop(bits: u32) -> TestResult {
            let v = f32::from_bits(bits);
            let exp = (bits >> 23) & 0xFF;
            if !v.is_finite() || exp == 0 || exp > 253 {
                return TestResult::discard();
            }
            TestResult::from_bool(Mbf32::from_f32(v).to_f32().to_bits() == bits)
        }
        QuickCheck::new()
            .tests(2000)
            .quickcheck(prop as fn(u32) -> TestResult);
    }

    #[test]
    fn test_f64_round_trip_property() {
        fn prop(v: f64) -> TestResult {
            if !v.is_finite() || v == 0.0 || v.abs() > 1.0e38 || v.abs() < 1.0e-38 {
                return TestResult::discard();
            }
            TestResult::from_bool(Mbf64::from_f64(v).to_f64() == v)
        }
        QuickCheck::new()
            .tests(2000)
            .quickcheck(prop as fn(f64) -> TestResult);
    }
}
