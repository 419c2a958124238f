//! Legacy number display and number scanning.

use super::val::check_range;
use super::Val;

/// Significant digits shown for each floating type.
const SINGLE_DIGITS: usize = 7;
const DOUBLE_DIGITS: usize = 16;

/// The text PRINT and STR$ use for a number: a leading space or minus
/// sign, then the digits. PRINT adds its own trailing space.
pub fn number(val: &Val) -> String {
    match val {
        Val::Integer(n) => signed(*n < 0, (*n as i32).abs() as f64, 0, 'E', true),
        Val::Single(n) => signed(*n < 0.0, (*n as f64).abs(), SINGLE_DIGITS, 'E', false),
        Val::Double(n) => signed(*n < 0.0, n.abs(), DOUBLE_DIGITS, 'D', false),
        Val::String(s) => crate::lang::cp437::to_string(s),
    }
}

fn signed(negative: bool, magnitude: f64, digits: usize, exp_char: char, integer: bool) -> String {
    let mut s = String::with_capacity(16);
    s.push(if negative { '-' } else { ' ' });
    if integer {
        s.push_str(&(magnitude as u64).to_string());
    } else {
        s.push_str(&unsigned(magnitude, digits, exp_char));
    }
    s
}

/// Decimal digits and exponent of `n` rounded to `digits` significant
/// places, trailing zeros removed. `n` must be positive.
fn decompose(n: f64, digits: usize) -> (String, i32) {
    let sci = format!("{:.*e}", digits - 1, n);
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => (sci.as_str(), "0"),
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let mut digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    while digits.len() > 1 && digits.ends_with('0') {
        digits.pop();
    }
    (digits, exp)
}

fn unsigned(n: f64, digits: usize, exp_char: char) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let (mantissa, exp) = decompose(n, digits);
    let len = mantissa.len() as i32;
    if exp >= digits as i32 || exp < -2 {
        let mut s = String::new();
        s.push_str(&mantissa[..1]);
        if len > 1 {
            s.push('.');
            s.push_str(&mantissa[1..]);
        }
        s.push(exp_char);
        s.push(if exp < 0 { '-' } else { '+' });
        s.push_str(&format!("{:02}", exp.abs()));
        s
    } else if exp < 0 {
        let mut s = String::from(".");
        for _ in 0..(-exp - 1) {
            s.push('0');
        }
        s.push_str(&mantissa);
        s
    } else if len > exp + 1 {
        let point = (exp + 1) as usize;
        format!("{}.{}", &mantissa[..point], &mantissa[point..])
    } else {
        let mut s = mantissa;
        for _ in 0..(exp + 1 - len) {
            s.push('0');
        }
        s
    }
}

/// Source text for a Single literal in a listing. A `!` is added when
/// the bare digits would crunch back to an Integer.
pub fn single_literal(n: f32) -> String {
    let s = unsigned((n as f64).abs(), SINGLE_DIGITS, 'E');
    let integral = !s.contains('.') && !s.contains('E');
    match s.parse::<f64>() {
        Ok(v) if integral && v <= i16::max_value() as f64 => format!("{}!", s),
        _ => s,
    }
}

/// Source text for a Double literal in a listing. A `#` is added unless
/// the text already reads back as a Double.
pub fn double_literal(n: f64) -> String {
    let s = unsigned(n.abs(), DOUBLE_DIGITS, 'D');
    let significant = s
        .trim_start_matches(|c| c == '0' || c == '.')
        .chars()
        .take_while(|c| *c != 'D')
        .filter(|c| c.is_ascii_digit())
        .count();
    if s.contains('D') || significant > SINGLE_DIGITS {
        s
    } else {
        format!("{}#", s)
    }
}

/// Scan a number from the start of `bytes` the way VAL and INPUT do.
/// Spaces are ignored anywhere. Returns the value and the number of
/// bytes consumed, or None when no digits were found.
pub fn scan(bytes: &[u8]) -> Option<(Val, usize)> {
    let mut i = 0;
    let mut text = String::new();
    let skip = |i: &mut usize| {
        while bytes.get(*i) == Some(&b' ') {
            *i += 1;
        }
    };
    skip(&mut i);
    if bytes.get(i) == Some(&b'&') {
        return scan_radix(bytes, i);
    }
    match bytes.get(i) {
        Some(b'-') => {
            text.push('-');
            i += 1;
        }
        Some(b'+') => i += 1,
        _ => {}
    }
    let mut digits = 0;
    let mut leading = true;
    let mut decimal = false;
    let mut exp: Option<u8> = None;
    let mut exp_digits = 0;
    let mut suffix: Option<u8> = None;
    loop {
        skip(&mut i);
        let c = match bytes.get(i) {
            Some(c) => *c,
            None => break,
        };
        if c.is_ascii_digit() {
            if exp.is_some() {
                exp_digits += 1;
            } else if c != b'0' || !leading {
                digits += 1;
                leading = false;
            }
            text.push(c as char);
        } else if c == b'.' && !decimal && exp.is_none() {
            decimal = true;
            text.push('.');
        } else if matches!(c, b'E' | b'e' | b'D' | b'd') && exp.is_none() {
            exp = Some(c.to_ascii_uppercase());
            text.push('E');
            if let Some(&sign) = bytes.get(i + 1) {
                if sign == b'+' || sign == b'-' {
                    text.push(sign as char);
                    i += 1;
                }
            }
        } else if matches!(c, b'%' | b'!' | b'#') && exp.is_none() {
            suffix = Some(c);
            i += 1;
            break;
        } else {
            break;
        }
        i += 1;
    }
    if exp.is_some() && exp_digits == 0 {
        text.push('0');
    }
    if !text.bytes().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if text.starts_with('.') || text.starts_with("-.") {
        text = text.replacen('.', "0.", 1);
    }
    let value: f64 = text.parse().ok()?;
    let val = match suffix {
        Some(b'%') => Val::Integer(super::val::cint(value).ok()?),
        Some(b'#') => Val::Double(value),
        Some(b'!') => Val::Single(value as f32),
        _ if exp == Some(b'D') || digits > SINGLE_DIGITS => Val::Double(value),
        _ if exp.is_none() && !decimal && value.abs() <= i16::max_value() as f64 => {
            Val::Integer(value as i16)
        }
        _ => Val::Single(value as f32),
    };
    let val = match val {
        Val::Single(n) if check_range(n as f64).is_err() => return None,
        Val::Double(n) if check_range(n).is_err() => return None,
        v => v,
    };
    skip(&mut i);
    Some((val, i))
}

fn scan_radix(bytes: &[u8], start: usize) -> Option<(Val, usize)> {
    let mut i = start + 1;
    let radix = match bytes.get(i) {
        Some(b'H') | Some(b'h') => {
            i += 1;
            16
        }
        Some(b'O') | Some(b'o') => {
            i += 1;
            8
        }
        _ => 8,
    };
    let digits_start = i;
    while bytes
        .get(i)
        .map_or(false, |c| (*c as char).is_digit(radix))
    {
        i += 1;
    }
    let digits = std::str::from_utf8(&bytes[digits_start..i]).ok()?;
    if digits.is_empty() {
        return Some((Val::Integer(0), i));
    }
    let value = u32::from_str_radix(digits, radix).ok()?;
    if value > 0xFFFF {
        return None;
    }
    Some((Val::Integer(value as u16 as i16), i))
}

/// A whole field must be a number, as INPUT and READ require.
pub fn parse(bytes: &[u8]) -> Option<Val> {
    let trimmed = trim(bytes);
    if trimmed.is_empty() {
        return Some(Val::Integer(0));
    }
    match scan(trimmed) {
        Some((val, used)) if used == trimmed.len() => Some(val),
        _ => None,
    }
}

pub fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ').unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(start, |p| p + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers() {
        assert_eq!(number(&Val::Integer(14)), " 14");
        assert_eq!(number(&Val::Integer(-32768)), "-32768");
        assert_eq!(number(&Val::Integer(0)), " 0");
    }

    #[test]
    fn test_singles() {
        assert_eq!(number(&Val::Single(3.5)), " 3.5");
        assert_eq!(number(&Val::Single(1.0 / 3.0)), " .3333333");
        assert_eq!(number(&Val::Single(-0.5)), "-.5");
        assert_eq!(number(&Val::Single(1000000.0)), " 1000000");
        assert_eq!(number(&Val::Single(10000000.0)), " 1E+07");
        assert_eq!(number(&Val::Single(0.01)), " .01");
        assert_eq!(number(&Val::Single(0.001)), " 1E-03");
        assert_eq!(number(&Val::Single(1.5e-5)), " 1.5E-05");
        assert_eq!(number(&Val::Single(32768.0)), " 32768");
        assert_eq!(number(&Val::Single(std::f32::consts::PI)), " 3.141593");
    }

    #[test]
    fn test_doubles() {
        assert_eq!(number(&Val::Double(1.0 / 3.0)), " .3333333333333333");
        assert_eq!(number(&Val::Double(1e20)), " 1D+20");
        assert_eq!(number(&Val::Double(123456789.0)), " 123456789");
    }

    #[test]
    fn test_literals() {
        assert_eq!(single_literal(3.0), "3!");
        assert_eq!(single_literal(40000.0), "40000");
        assert_eq!(single_literal(1.5), "1.5");
        assert_eq!(double_literal(2.0), "2#");
        assert_eq!(double_literal(3.14159265), "3.14159265");
    }

    #[test]
    fn test_scan() {
        assert_eq!(scan(b"  12 3abc"), Some((Val::Integer(123), 6)));
        assert_eq!(scan(b"-1.5E2"), Some((Val::Single(-150.0), 6)));
        assert_eq!(scan(b"&HFF"), Some((Val::Integer(255), 4)));
        assert_eq!(scan(b"abc"), None);
        assert_eq!(parse(b" 42 "), Some(Val::Integer(42)));
        assert_eq!(parse(b"4x"), None);
        assert_eq!(parse(b""), Some(Val::Integer(0)));
        assert_eq!(parse(b"1#"), Some(Val::Double(1.0)));
    }
}
