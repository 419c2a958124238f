use super::mbf::{Mbf32, Mbf64};
use super::val::{check_range, cint};
use super::{format, Val};
use crate::error;
use crate::lang::token::{func, tok, xfunc, Code, PREFIX_FN, PREFIX_XFN};
use crate::lang::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in functions that need nothing but their arguments
///
/// Functions touching the machine (RND, PEEK, EOF, POS and friends) are
/// answered by the runtime instead.
pub struct Function {}

fn arity(args: &[Val], range: std::ops::RangeInclusive<usize>) -> Result<()> {
    if range.contains(&args.len()) {
        Ok(())
    } else {
        Err(error!(SyntaxError))
    }
}

fn byte_arg(val: &Val) -> Result<usize> {
    let n = i16::try_from(val.clone())?;
    if !(0..=255).contains(&n) {
        return Err(error!(IllegalFunctionCall));
    }
    Ok(n as usize)
}

fn string_arg(val: &Val) -> Result<&[u8]> {
    match val {
        Val::String(s) => Ok(s),
        _ => Err(error!(TypeMismatch)),
    }
}

/// Transcendentals keep Double precision and otherwise compute in Single.
fn float_fn(val: &Val, f: fn(f64) -> f64) -> Result<Val> {
    match val {
        Val::Double(n) => Ok(Val::Double(check_range(f(*n))?)),
        Val::String(_) => Err(error!(TypeMismatch)),
        _ => {
            let n = f64::try_from(val.clone())?;
            Ok(Val::Single(check_range(f(n))? as f32))
        }
    }
}

impl Function {
    /// Evaluate a pure built-in. None when `code` is not one.
    pub fn call(code: Code, args: &[Val]) -> Option<Result<Val>> {
        let result = match code {
            Code::Prefixed(PREFIX_FN, index) => Function::standard(index, args)?,
            Code::Prefixed(PREFIX_XFN, index) => Function::extended(index, args)?,
            Code::Byte(tok::STRING) => arity(args, 2..=2).and_then(|_| Function::string(&args[0], &args[1])),
            Code::Byte(tok::INSTR) => arity(args, 2..=3).and_then(|_| Function::instr(args)),
            _ => return None,
        };
        Some(result)
    }

    fn standard(index: u8, args: &[Val]) -> Option<Result<Val>> {
        let one = |f: fn(&Val) -> Result<Val>| arity(args, 1..=1).and_then(|_| f(&args[0]));
        Some(match index {
            func::LEFT => arity(args, 2..=2).and_then(|_| Function::left(&args[0], &args[1])),
            func::RIGHT => arity(args, 2..=2).and_then(|_| Function::right(&args[0], &args[1])),
            func::MID => arity(args, 2..=3).and_then(|_| Function::mid(args)),
            func::SGN => one(Function::sgn),
            func::INT => one(Function::int),
            func::ABS => one(Function::abs),
            func::SQR => one(Function::sqr),
            func::SIN => one(Function::sin),
            func::LOG => one(Function::log),
            func::EXP => one(Function::exp),
            func::COS => one(Function::cos),
            func::TAN => one(Function::tan),
            func::ATN => one(Function::atn),
            func::LEN => one(Function::len),
            func::STR => one(Function::str),
            func::VAL => one(Function::val),
            func::ASC => one(Function::asc),
            func::CHR => one(Function::chr),
            func::SPACE => one(Function::space),
            func::OCT => one(|v| Function::radix(v, 8)),
            func::HEX => one(|v| Function::radix(v, 16)),
            func::CINT => one(|v| Ok(Val::Integer(i16::try_from(v.clone())?))),
            func::CSNG => one(|v| Ok(Val::Single(f32::try_from(v.clone())?))),
            func::CDBL => one(|v| Ok(Val::Double(f64::try_from(v.clone())?))),
            func::FIX => one(Function::fix),
            _ => return None,
        })
    }

    fn extended(index: u8, args: &[Val]) -> Option<Result<Val>> {
        let one = |f: fn(&Val) -> Result<Val>| arity(args, 1..=1).and_then(|_| f(&args[0]));
        Some(match index {
            xfunc::CVI => one(|v| {
                let s = Function::convert_bytes(v, 2)?;
                Ok(Val::Integer(i16::from_le_bytes([s[0], s[1]])))
            }),
            xfunc::CVS => one(|v| {
                let s = Function::convert_bytes(v, 4)?;
                Ok(Val::Single(Mbf32::from_le_bytes([s[0], s[1], s[2], s[3]]).to_f32()))
            }),
            xfunc::CVD => one(|v| {
                let s = Function::convert_bytes(v, 8)?;
                let mut b = [0u8; 8];
                b.copy_from_slice(&s[..8]);
                Ok(Val::Double(Mbf64::from_le_bytes(b).to_f64()))
            }),
            xfunc::MKI => one(|v| {
                Ok(Val::String(i16::try_from(v.clone())?.to_le_bytes().to_vec()))
            }),
            xfunc::MKS => one(|v| {
                let n = f32::try_from(v.clone())?;
                Ok(Val::String(Mbf32::from(n).to_le_bytes().to_vec()))
            }),
            xfunc::MKD => one(|v| {
                let n = f64::try_from(v.clone())?;
                Ok(Val::String(Mbf64::from(n).to_le_bytes().to_vec()))
            }),
            _ => return None,
        })
    }

    fn convert_bytes(val: &Val, len: usize) -> Result<Vec<u8>> {
        let s = string_arg(val)?;
        if s.len() < len {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(s[..len].to_vec())
    }

    pub fn left(s: &Val, n: &Val) -> Result<Val> {
        let s = string_arg(s)?;
        let n = byte_arg(n)?.min(s.len());
        Ok(Val::String(s[..n].to_vec()))
    }

    pub fn right(s: &Val, n: &Val) -> Result<Val> {
        let s = string_arg(s)?;
        let n = byte_arg(n)?.min(s.len());
        Ok(Val::String(s[s.len() - n..].to_vec()))
    }

    pub fn mid(args: &[Val]) -> Result<Val> {
        let s = string_arg(&args[0])?;
        let start = byte_arg(&args[1])?;
        if start == 0 {
            return Err(error!(IllegalFunctionCall));
        }
        let len = match args.get(2) {
            Some(v) => byte_arg(v)?,
            None => 255,
        };
        if start > s.len() {
            return Ok(Val::String(vec![]));
        }
        let end = (start - 1 + len).min(s.len());
        Ok(Val::String(s[start - 1..end].to_vec()))
    }

    pub fn sgn(val: &Val) -> Result<Val> {
        let n = f64::try_from(val.clone())?;
        Ok(Val::Integer(if n > 0.0 {
            1
        } else if n < 0.0 {
            -1
        } else {
            0
        }))
    }

    /// Floor, as an Integer.
    pub fn int(val: &Val) -> Result<Val> {
        match val {
            Val::Integer(_) => Ok(val.clone()),
            _ => Ok(Val::Integer(cint(f64::try_from(val.clone())?.floor())?)),
        }
    }

    /// Truncation toward zero, as an Integer.
    pub fn fix(val: &Val) -> Result<Val> {
        match val {
            Val::Integer(_) => Ok(val.clone()),
            _ => Ok(Val::Integer(cint(f64::try_from(val.clone())?.trunc())?)),
        }
    }

    pub fn abs(val: &Val) -> Result<Val> {
        match val {
            Val::Integer(n) => Ok(match n.checked_abs() {
                Some(n) => Val::Integer(n),
                None => Val::Single(-(*n as f32)),
            }),
            Val::Single(n) => Ok(Val::Single(n.abs())),
            Val::Double(n) => Ok(Val::Double(n.abs())),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn sqr(val: &Val) -> Result<Val> {
        if f64::try_from(val.clone())? < 0.0 {
            return Err(error!(IllegalFunctionCall));
        }
        float_fn(val, f64::sqrt)
    }

    pub fn log(val: &Val) -> Result<Val> {
        if f64::try_from(val.clone())? <= 0.0 {
            return Err(error!(IllegalFunctionCall));
        }
        float_fn(val, f64::ln)
    }

    pub fn exp(val: &Val) -> Result<Val> {
        float_fn(val, f64::exp)
    }

    pub fn cos(val: &Val) -> Result<Val> {
        float_fn(val, f64::cos)
    }

    pub fn sin(val: &Val) -> Result<Val> {
        float_fn(val, f64::sin)
    }

    pub fn tan(val: &Val) -> Result<Val> {
        float_fn(val, f64::tan)
    }

    pub fn atn(val: &Val) -> Result<Val> {
        float_fn(val, f64::atan)
    }

    pub fn len(val: &Val) -> Result<Val> {
        Ok(Val::Integer(string_arg(val)?.len() as i16))
    }

    pub fn str(val: &Val) -> Result<Val> {
        match val {
            Val::String(_) => Err(error!(TypeMismatch)),
            _ => Ok(Val::String(format::number(val).into_bytes())),
        }
    }

    pub fn val(val: &Val) -> Result<Val> {
        let s = string_arg(val)?;
        Ok(match format::scan(s) {
            Some((v, _)) => v,
            None => Val::Integer(0),
        })
    }

    pub fn asc(val: &Val) -> Result<Val> {
        match string_arg(val)?.first() {
            Some(&c) => Ok(Val::Integer(c as i16)),
            None => Err(error!(IllegalFunctionCall)),
        }
    }

    pub fn chr(val: &Val) -> Result<Val> {
        Ok(Val::String(vec![byte_arg(val)? as u8]))
    }

    pub fn space(val: &Val) -> Result<Val> {
        Ok(Val::String(vec![b' '; byte_arg(val)?]))
    }

    /// STRING$(n, code) or STRING$(n, "text").
    pub fn string(n: &Val, fill: &Val) -> Result<Val> {
        let n = byte_arg(n)?;
        let c = match fill {
            Val::String(s) => *s.first().ok_or_else(|| error!(IllegalFunctionCall))?,
            _ => byte_arg(fill)? as u8,
        };
        Ok(Val::String(vec![c; n]))
    }

    /// INSTR([start,] haystack, needle); 0 when not found.
    pub fn instr(args: &[Val]) -> Result<Val> {
        let (start, hay, needle) = if args.len() == 3 {
            (byte_arg(&args[0])?, &args[1], &args[2])
        } else {
            (1, &args[0], &args[1])
        };
        if start == 0 {
            return Err(error!(IllegalFunctionCall));
        }
        let hay = string_arg(hay)?;
        let needle = string_arg(needle)?;
        if start > hay.len() {
            return Ok(Val::Integer(0));
        }
        if needle.is_empty() {
            return Ok(Val::Integer(start as i16));
        }
        let found = hay[start - 1..]
            .windows(needle.len())
            .position(|w| w == needle)
            .map_or(0, |p| p + start);
        Ok(Val::Integer(found as i16))
    }

    /// HEX$ and OCT$ of a value in -32768..=65535.
    pub fn radix(val: &Val, radix: u32) -> Result<Val> {
        let n = f64::try_from(val.clone())?.round();
        if !(-32768.0..=65535.0).contains(&n) {
            return Err(error!(Overflow));
        }
        let n = if n < 0.0 { (n as i32 + 65536) as u32 } else { n as u32 };
        let s = match radix {
            16 => format!("{:X}", n),
            _ => format!("{:o}", n),
        };
        Ok(Val::String(s.into_bytes()))
    }
}

/// ## RND
///
/// A seeded generator so a given RANDOMIZE seed always yields the same
/// sequence.
#[derive(Debug)]
pub struct Random {
    rng: StdRng,
    last: f32,
}

impl Default for Random {
    fn default() -> Random {
        Random {
            rng: StdRng::seed_from_u64(0),
            last: 0.0,
        }
    }
}

impl Random {
    pub fn randomize(&mut self, seed: f64) {
        self.rng = StdRng::seed_from_u64(seed.to_bits());
    }

    /// RND(n): zero repeats the last number, a negative argument reseeds
    /// from `clock` first, anything else draws the next.
    /// A positive argument draws the next number the same as an omitted
    /// one; it never reseeds.
    pub fn rnd(&mut self, arg: Option<f64>, clock: u64) -> f32 {
        match arg {
            Some(n) if n == 0.0 => return self.last,
            Some(n) if n < 0.0 => self.rng = StdRng::seed_from_u64(clock),
            _ => {}
        }
        self.last = self.rng.gen::<f32>();
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Val {
        Val::from(v)
    }

    fn call(index: u8, args: Vec<Val>) -> Result<Val> {
        Function::call(Code::Prefixed(PREFIX_FN, index), &args).unwrap()
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call(func::LEFT, vec![s("HELLO"), Val::Integer(2)]), Ok(s("HE")));
        assert_eq!(call(func::RIGHT, vec![s("HELLO"), Val::Integer(9)]), Ok(s("HELLO")));
        assert_eq!(
            call(func::MID, vec![s("HELLO"), Val::Integer(2), Val::Integer(3)]),
            Ok(s("ELL"))
        );
        assert_eq!(call(func::MID, vec![s("HI"), Val::Integer(5)]), Ok(s("")));
        assert_eq!(call(func::MID, vec![s("HI"), Val::Integer(0)]).unwrap_err().code(), 5);
        assert_eq!(call(func::STR, vec![Val::Integer(7)]), Ok(s(" 7")));
        assert_eq!(call(func::VAL, vec![s(" 12.5x")]), Ok(Val::Single(12.5)));
        assert_eq!(call(func::CHR, vec![Val::Integer(256)]).unwrap_err().code(), 5);
        assert_eq!(call(func::HEX, vec![Val::Integer(-1)]), Ok(s("FFFF")));
        assert_eq!(call(func::OCT, vec![Val::Integer(8)]), Ok(s("10")));
        assert_eq!(call(func::LEN, vec![Val::Integer(8)]).unwrap_err().code(), 13);
    }

    #[test]
    fn test_instr_and_string() {
        let instr = |args: Vec<Val>| Function::call(Code::Byte(tok::INSTR), &args).unwrap();
        assert_eq!(instr(vec![s("ABCABC"), s("CA")]), Ok(Val::Integer(3)));
        assert_eq!(instr(vec![Val::Integer(4), s("ABCABC"), s("B")]), Ok(Val::Integer(5)));
        assert_eq!(instr(vec![s("ABC"), s("")]), Ok(Val::Integer(1)));
        assert_eq!(instr(vec![s("ABC"), s("Z")]), Ok(Val::Integer(0)));
        let string = |args: Vec<Val>| Function::call(Code::Byte(tok::STRING), &args).unwrap();
        assert_eq!(string(vec![Val::Integer(3), s("xy")]), Ok(s("xxx")));
        assert_eq!(string(vec![Val::Integer(2), Val::Integer(65)]), Ok(s("AA")));
    }

    #[test]
    fn test_int_and_fix() {
        assert_eq!(call(func::INT, vec![Val::Single(-2.5)]), Ok(Val::Integer(-3)));
        assert_eq!(call(func::FIX, vec![Val::Single(-2.5)]), Ok(Val::Integer(-2)));
        assert_eq!(call(func::INT, vec![Val::Double(1e6)]).unwrap_err().code(), 6);
        assert_eq!(call(func::ABS, vec![Val::Integer(-32768)]), Ok(Val::Single(32768.0)));
        assert_eq!(call(func::SQR, vec![Val::Integer(-1)]).unwrap_err().code(), 5);
        assert_eq!(call(func::SGN, vec![Val::Double(-0.1)]), Ok(Val::Integer(-1)));
    }

    #[test]
    fn test_mks_cvs() {
        let mks = Function::call(Code::Prefixed(PREFIX_XFN, xfunc::MKS), &[Val::Single(3.5)])
            .unwrap()
            .unwrap();
        let cvs = Function::call(Code::Prefixed(PREFIX_XFN, xfunc::CVS), &[mks])
            .unwrap()
            .unwrap();
        assert_eq!(cvs, Val::Single(3.5));
        let cvi = Function::call(Code::Prefixed(PREFIX_XFN, xfunc::CVI), &[s("A")]).unwrap();
        assert_eq!(cvi.unwrap_err().code(), 5);
    }

    #[test]
    fn test_random_is_reproducible() {
        let mut a = Random::default();
        let mut b = Random::default();
        a.randomize(42.0);
        b.randomize(42.0);
        let xs: Vec<f32> = (0..5).map(|_| a.rnd(None, 0)).collect();
        let ys: Vec<f32> = (0..5).map(|_| b.rnd(Some(1.0), 0)).collect();
        assert_eq!(xs, ys);
        assert_ne!(ys[0], ys[1]);
        assert_eq!(a.rnd(Some(0.0), 0), xs[4]);
        assert!(xs.iter().all(|x| (0.0..1.0).contains(x)));
    }
}
