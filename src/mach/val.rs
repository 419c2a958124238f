use super::mbf;
use crate::error;
use crate::lang::{Error, Type};
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## Evaluated values
///
/// Strings here are owned temporaries. Only variable slots hold heap
/// descriptors; a value becomes a descriptor when it is stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    String(Vec<u8>),
    Integer(i16),
    Single(f32),
    Double(f64),
}

impl Val {
    pub fn zero(ty: Type) -> Val {
        match ty {
            Type::Integer => Val::Integer(0),
            Type::Single => Val::Single(0.0),
            Type::Double => Val::Double(0.0),
            Type::String => Val::String(vec![]),
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Val::String(_) => Type::String,
            Val::Integer(_) => Type::Integer,
            Val::Single(_) => Type::Single,
            Val::Double(_) => Type::Double,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Val::String(_))
    }

    pub fn to_f64(&self) -> Result<f64> {
        f64::try_from(self.clone())
    }

    /// Non-zero is true. Strings are a type mismatch.
    pub fn truth(&self) -> Result<bool> {
        match self {
            Val::Integer(n) => Ok(*n != 0),
            Val::Single(n) => Ok(*n != 0.0),
            Val::Double(n) => Ok(*n != 0.0),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Val::String(s) => Ok(s),
            _ => Err(error!(TypeMismatch)),
        }
    }

    /// Convert for storage into a slot of type `ty`. Numbers convert
    /// among themselves; strings and numbers never mix.
    pub fn coerce(self, ty: Type) -> Result<Val> {
        match ty {
            Type::String => match self {
                Val::String(_) => Ok(self),
                _ => Err(error!(TypeMismatch)),
            },
            Type::Integer => Ok(Val::Integer(i16::try_from(self)?)),
            Type::Single => Ok(Val::Single(f32::try_from(self)?)),
            Type::Double => Ok(Val::Double(f64::try_from(self)?)),
        }
    }
}

/// Round half away from zero into Int16 range, as CINT does.
pub fn cint(n: f64) -> Result<i16> {
    let r = n.round();
    if r.is_nan() || r < i16::min_value() as f64 || r > i16::max_value() as f64 {
        Err(error!(Overflow))
    } else {
        Ok(r as i16)
    }
}

/// Reject magnitudes MBF cannot hold and flush tiny ones to zero.
pub fn check_range(n: f64) -> Result<f64> {
    if !n.is_finite() || n.abs() > mbf::max_magnitude() {
        Err(error!(Overflow))
    } else if n.abs() < mbf::min_magnitude() {
        Ok(0.0)
    } else {
        Ok(n)
    }
}

impl TryFrom<Val> for i16 {
    type Error = Error;
    fn try_from(val: Val) -> Result<i16> {
        match val {
            Val::Integer(n) => Ok(n),
            Val::Single(n) => cint(n as f64),
            Val::Double(n) => cint(n),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<Val> for f32 {
    type Error = Error;
    fn try_from(val: Val) -> Result<f32> {
        match val {
            Val::Integer(n) => Ok(n as f32),
            Val::Single(n) => Ok(n),
            Val::Double(n) => Ok(check_range(n)? as f32),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<Val> for f64 {
    type Error = Error;
    fn try_from(val: Val) -> Result<f64> {
        match val {
            Val::Integer(n) => Ok(n as f64),
            Val::Single(n) => Ok(n as f64),
            Val::Double(n) => Ok(n),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }
}

impl TryFrom<Val> for Vec<u8> {
    type Error = Error;
    fn try_from(val: Val) -> Result<Vec<u8>> {
        val.into_bytes()
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Val {
        Val::String(crate::lang::cp437::to_bytes(s))
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Val {
        Val::Integer(if b { -1 } else { 0 })
    }
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Val::String(s) => write!(f, "{}", crate::lang::cp437::to_string(s)),
            _ => write!(f, "{}", super::format::number(self)),
        }
    }
}
