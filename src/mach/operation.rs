use super::val::check_range;
use super::Val;
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// Operands after promotion to their common type.
enum Pair {
    Integer(i16, i16),
    Single(f32, f32),
    Double(f64, f64),
    String(Vec<u8>, Vec<u8>),
}

fn promote(lhs: Val, rhs: Val) -> Result<Pair> {
    use Val::*;
    match (lhs, rhs) {
        (String(l), String(r)) => Ok(Pair::String(l, r)),
        (String(_), _) | (_, String(_)) => Err(error!(TypeMismatch)),
        (Integer(l), Integer(r)) => Ok(Pair::Integer(l, r)),
        (Double(l), r) => Ok(Pair::Double(l, f64::try_from(r)?)),
        (l, Double(r)) => Ok(Pair::Double(f64::try_from(l)?, r)),
        (l, r) => Ok(Pair::Single(f32::try_from(l)?, f32::try_from(r)?)),
    }
}

fn single(n: f32) -> Result<Val> {
    Ok(Val::Single(check_range(n as f64)? as f32))
}

fn double(n: f64) -> Result<Val> {
    Ok(Val::Double(check_range(n)?))
}

fn integer(val: Val) -> Result<i16> {
    i16::try_from(val)
}

/// ## The numeric engine's operators
///
/// Integer results that leave Int16 range are promoted to Single rather
/// than wrapped. Floating results beyond MBF range are an Overflow.
pub struct Operation {}

impl Operation {
    pub fn negate(val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Integer(n) => match n.checked_neg() {
                Some(n) => Ok(Integer(n)),
                None => Ok(Single(-(n as f32))),
            },
            Single(n) => Ok(Single(-n)),
            Double(n) => Ok(Double(-n)),
            String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn sum(lhs: Val, rhs: Val) -> Result<Val> {
        match promote(lhs, rhs)? {
            Pair::Integer(l, r) => match l.checked_add(r) {
                Some(n) => Ok(Val::Integer(n)),
                None => single(l as f32 + r as f32),
            },
            Pair::Single(l, r) => single(l + r),
            Pair::Double(l, r) => double(l + r),
            Pair::String(mut l, r) => {
                if l.len() + r.len() > 255 {
                    return Err(error!(StringTooLong));
                }
                l.extend(r);
                Ok(Val::String(l))
            }
        }
    }

    pub fn subtract(lhs: Val, rhs: Val) -> Result<Val> {
        match promote(lhs, rhs)? {
            Pair::Integer(l, r) => match l.checked_sub(r) {
                Some(n) => Ok(Val::Integer(n)),
                None => single(l as f32 - r as f32),
            },
            Pair::Single(l, r) => single(l - r),
            Pair::Double(l, r) => double(l - r),
            Pair::String(_, _) => Err(error!(TypeMismatch)),
        }
    }

    pub fn multiply(lhs: Val, rhs: Val) -> Result<Val> {
        match promote(lhs, rhs)? {
            Pair::Integer(l, r) => match l.checked_mul(r) {
                Some(n) => Ok(Val::Integer(n)),
                None => single(l as f32 * r as f32),
            },
            Pair::Single(l, r) => single(l * r),
            Pair::Double(l, r) => double(l * r),
            Pair::String(_, _) => Err(error!(TypeMismatch)),
        }
    }

    /// `/` is always a floating division.
    pub fn divide(lhs: Val, rhs: Val) -> Result<Val> {
        match promote(lhs, rhs)? {
            Pair::Integer(l, r) => {
                if r == 0 {
                    return Err(error!(DivisionByZero));
                }
                single(l as f32 / r as f32)
            }
            Pair::Single(l, r) => {
                if r == 0.0 {
                    return Err(error!(DivisionByZero));
                }
                single(l / r)
            }
            Pair::Double(l, r) => {
                if r == 0.0 {
                    return Err(error!(DivisionByZero));
                }
                double(l / r)
            }
            Pair::String(_, _) => Err(error!(TypeMismatch)),
        }
    }

    /// `\` rounds both sides to Int16 first and truncates the quotient.
    pub fn divide_int(lhs: Val, rhs: Val) -> Result<Val> {
        if lhs.is_string() || rhs.is_string() {
            return Err(error!(TypeMismatch));
        }
        let l = integer(lhs)?;
        let r = integer(rhs)?;
        if r == 0 {
            return Err(error!(DivisionByZero));
        }
        match l.checked_div(r) {
            Some(n) => Ok(Val::Integer(n)),
            None => single(l as f32 / r as f32),
        }
    }

    pub fn modulus(lhs: Val, rhs: Val) -> Result<Val> {
        if lhs.is_string() || rhs.is_string() {
            return Err(error!(TypeMismatch));
        }
        let l = integer(lhs)?;
        let r = integer(rhs)?;
        if r == 0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Integer(l.checked_rem(r).unwrap_or(0)))
    }

    pub fn power(lhs: Val, rhs: Val) -> Result<Val> {
        let pair = promote(lhs, rhs)?;
        let (l, r, is_double) = match pair {
            Pair::Integer(l, r) => (l as f64, r as f64, false),
            Pair::Single(l, r) => (l as f64, r as f64, false),
            Pair::Double(l, r) => (l, r, true),
            Pair::String(_, _) => return Err(error!(TypeMismatch)),
        };
        if l == 0.0 && r < 0.0 {
            return Err(error!(DivisionByZero));
        }
        if l < 0.0 && r.fract() != 0.0 {
            return Err(error!(IllegalFunctionCall));
        }
        let n = if r.fract() == 0.0 && r.abs() <= i32::max_value() as f64 {
            l.powi(r as i32)
        } else {
            l.powf(r)
        };
        if is_double {
            double(n)
        } else {
            single(check_range(n)? as f32)
        }
    }

    fn compare(lhs: Val, rhs: Val) -> Result<std::cmp::Ordering> {
        use std::cmp::Ordering;
        Ok(match promote(lhs, rhs)? {
            Pair::Integer(l, r) => l.cmp(&r),
            Pair::Single(l, r) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            Pair::Double(l, r) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            Pair::String(l, r) => l.cmp(&r),
        })
    }

    pub fn equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(lhs, rhs)?.is_eq()))
    }

    pub fn not_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(lhs, rhs)?.is_ne()))
    }

    pub fn less(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(lhs, rhs)?.is_lt()))
    }

    pub fn less_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(lhs, rhs)?.is_le()))
    }

    pub fn greater(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(lhs, rhs)?.is_gt()))
    }

    pub fn greater_equal(lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::from(Operation::compare(lhs, rhs)?.is_ge()))
    }

    fn bitwise(lhs: Val, rhs: Val, f: fn(i16, i16) -> i16) -> Result<Val> {
        if lhs.is_string() || rhs.is_string() {
            return Err(error!(TypeMismatch));
        }
        Ok(Val::Integer(f(integer(lhs)?, integer(rhs)?)))
    }

    pub fn not(val: Val) -> Result<Val> {
        if val.is_string() {
            return Err(error!(TypeMismatch));
        }
        Ok(Val::Integer(!integer(val)?))
    }

    pub fn and(lhs: Val, rhs: Val) -> Result<Val> {
        Operation::bitwise(lhs, rhs, |l, r| l & r)
    }

    pub fn or(lhs: Val, rhs: Val) -> Result<Val> {
        Operation::bitwise(lhs, rhs, |l, r| l | r)
    }

    pub fn xor(lhs: Val, rhs: Val) -> Result<Val> {
        Operation::bitwise(lhs, rhs, |l, r| l ^ r)
    }

    pub fn eqv(lhs: Val, rhs: Val) -> Result<Val> {
        Operation::bitwise(lhs, rhs, |l, r| !(l ^ r))
    }

    pub fn imp(lhs: Val, rhs: Val) -> Result<Val> {
        Operation::bitwise(lhs, rhs, |l, r| !l | r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn test_integer_overflow_promotes() {
        assert_eq!(
            Operation::sum(Val::Integer(32767), Val::Integer(1)),
            Ok(Val::Single(32768.0))
        );
        assert_eq!(
            Operation::multiply(Val::Integer(300), Val::Integer(300)),
            Ok(Val::Single(90000.0))
        );
        assert_eq!(
            Operation::negate(Val::Integer(-32768)),
            Ok(Val::Single(32768.0))
        );
        assert_eq!(
            Operation::sum(Val::Integer(2), Val::Integer(3)),
            Ok(Val::Integer(5))
        );
    }

    #[test]
    fn test_division() {
        assert_eq!(
            Operation::divide(Val::Integer(7), Val::Integer(2)),
            Ok(Val::Single(3.5))
        );
        assert_eq!(
            Operation::divide(Val::Integer(1), Val::Integer(0))
                .unwrap_err()
                .code(),
            11
        );
        assert_eq!(
            Operation::divide(Val::Double(1.0), Val::Single(0.0))
                .unwrap_err()
                .code(),
            11
        );
        assert_eq!(
            Operation::divide_int(Val::Single(7.6), Val::Integer(2)),
            Ok(Val::Integer(4))
        );
        assert_eq!(
            Operation::modulus(Val::Integer(-7), Val::Integer(2)),
            Ok(Val::Integer(-1))
        );
        assert_eq!(
            Operation::modulus(Val::Integer(7), Val::Integer(0))
                .unwrap_err()
                .code(),
            11
        );
    }

    #[test]
    fn test_power() {
        assert_eq!(
            Operation::power(Val::Integer(2), Val::Integer(10)),
            Ok(Val::Single(1024.0))
        );
        assert_eq!(
            Operation::power(Val::Integer(0), Val::Integer(-1))
                .unwrap_err()
                .code(),
            11
        );
        assert_eq!(
            Operation::power(Val::Integer(-8), Val::Single(0.5))
                .unwrap_err()
                .code(),
            5
        );
        assert_eq!(
            Operation::power(Val::Integer(10), Val::Integer(39))
                .unwrap_err()
                .code(),
            6
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            Operation::sum(Val::from("AB"), Val::from("CD")),
            Ok(Val::from("ABCD"))
        );
        assert_eq!(
            Operation::less(Val::from("ABC"), Val::from("ABD")),
            Ok(Val::Integer(-1))
        );
        assert_eq!(
            Operation::sum(Val::from("A"), Val::Integer(1))
                .unwrap_err()
                .code(),
            13
        );
        let long = Val::String(vec![b'X'; 200]);
        assert_eq!(
            Operation::sum(long.clone(), long).unwrap_err().code(),
            15
        );
    }

    #[test]
    fn test_logic() {
        assert_eq!(
            Operation::and(Val::Integer(12), Val::Integer(10)),
            Ok(Val::Integer(8))
        );
        assert_eq!(Operation::not(Val::Integer(0)), Ok(Val::Integer(-1)));
        assert_eq!(
            Operation::imp(Val::Integer(0), Val::Integer(0)),
            Ok(Val::Integer(-1))
        );
        assert_eq!(
            Operation::eqv(Val::Integer(-1), Val::Integer(0)),
            Ok(Val::Integer(0))
        );
    }

    quickcheck! {
        fn prop_comparisons_are_zero_or_minus_one(a: i16, b: f32) -> bool {
            let b = if b.is_finite() { b } else { 0.0 };
            [
                Operation::equal(Val::Integer(a), Val::Single(b)),
                Operation::less(Val::Integer(a), Val::Single(b)),
                Operation::greater_equal(Val::Single(b), Val::Integer(a)),
                Operation::not_equal(Val::Double(b as f64), Val::Integer(a)),
            ]
            .iter()
            .all(|r| matches!(r, Ok(Val::Integer(0)) | Ok(Val::Integer(-1))))
        }
    }
}
