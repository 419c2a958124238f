use super::Val;
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// ## PRINT USING
///
/// The format string is a run of literal text and fields. Values are
/// consumed one per field and the format restarts from the beginning
/// while values remain. Output stops at the first field with no value.
pub fn format(template: &[u8], values: &[Val]) -> Result<String> {
    let mut scanner = Scanner {
        src: template,
        pos: 0,
    };
    if !scanner.has_field() {
        return Err(error!(IllegalFunctionCall));
    }
    let mut out = String::new();
    let mut values = values.iter();
    let mut next = values.next();
    loop {
        scanner.literals(&mut out);
        let val = match next {
            Some(val) => val,
            None => break,
        };
        match scanner.field() {
            Some(field) => {
                field.render(val, &mut out)?;
                next = values.next();
            }
            None => scanner.pos = 0,
        }
    }
    Ok(out)
}

#[derive(Debug, PartialEq)]
enum Field {
    First,
    All,
    Fixed(usize),
    Number(Picture),
}

#[derive(Debug, Default, PartialEq)]
struct Picture {
    lead_sign: bool,
    trail: Option<u8>,
    fill: bool,
    dollar: bool,
    comma: bool,
    before: usize,
    decimal: bool,
    after: usize,
    exponent: usize,
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn at(&self, pos: usize) -> u8 {
        self.src.get(pos).copied().unwrap_or(0)
    }

    fn starts(&self, pos: usize, s: &[u8]) -> bool {
        self.src.len() >= pos + s.len() && &self.src[pos..pos + s.len()] == s
    }

    fn has_field(&self) -> bool {
        let mut pos = 0;
        while pos < self.src.len() {
            if self.at(pos) == b'_' {
                pos += 2;
                continue;
            }
            if self.field_width(pos).is_some() {
                return true;
            }
            pos += 1;
        }
        false
    }

    /// Length of the field starting at `pos`, if one does.
    fn field_width(&self, pos: usize) -> Option<usize> {
        match self.at(pos) {
            b'!' | b'&' => Some(1),
            b'\\' => {
                let mut end = pos + 1;
                while self.at(end) == b' ' {
                    end += 1;
                }
                if self.at(end) == b'\\' {
                    Some(end + 1 - pos)
                } else {
                    None
                }
            }
            _ if self.numeric_start(pos) => Some(1),
            _ => None,
        }
    }

    fn numeric_start(&self, pos: usize) -> bool {
        match self.at(pos) {
            b'#' => true,
            b'.' => self.at(pos + 1) == b'#',
            b'*' => self.at(pos + 1) == b'*',
            b'$' => self.at(pos + 1) == b'$',
            b'+' => self.at(pos + 1) != b'+' && self.numeric_start(pos + 1),
            _ => false,
        }
    }

    /// Copy literal text up to the next field or the end.
    fn literals(&mut self, out: &mut String) {
        while self.pos < self.src.len() {
            let c = self.at(self.pos);
            if c == b'_' {
                if let Some(&lit) = self.src.get(self.pos + 1) {
                    out.push(lit as char);
                }
                self.pos += 2;
                continue;
            }
            if self.field_width(self.pos).is_some() {
                return;
            }
            out.push(c as char);
            self.pos += 1;
        }
    }

    fn field(&mut self) -> Option<Field> {
        let width = self.field_width(self.pos)?;
        let field = match self.at(self.pos) {
            b'!' => Field::First,
            b'&' => Field::All,
            b'\\' => Field::Fixed(width),
            _ => return Some(Field::Number(self.picture())),
        };
        self.pos += width;
        Some(field)
    }

    fn picture(&mut self) -> Picture {
        let mut p = Picture::default();
        if self.at(self.pos) == b'+' {
            p.lead_sign = true;
            p.before += 1;
            self.pos += 1;
        }
        if self.starts(self.pos, b"**$") {
            p.fill = true;
            p.dollar = true;
            p.before += 3;
            self.pos += 3;
        } else if self.starts(self.pos, b"**") {
            p.fill = true;
            p.before += 2;
            self.pos += 2;
        } else if self.starts(self.pos, b"$$") {
            p.dollar = true;
            p.before += 2;
            self.pos += 2;
        }
        loop {
            match self.at(self.pos) {
                b'#' => p.before += 1,
                b',' if p.before > 0 => {
                    p.comma = true;
                    p.before += 1;
                }
                _ => break,
            }
            self.pos += 1;
        }
        if self.at(self.pos) == b'.' {
            p.decimal = true;
            self.pos += 1;
            while self.at(self.pos) == b'#' {
                p.after += 1;
                self.pos += 1;
            }
        }
        if self.starts(self.pos, b"^^^^") {
            p.exponent = if self.starts(self.pos, b"^^^^^") { 5 } else { 4 };
            self.pos += p.exponent;
        }
        if !p.lead_sign && matches!(self.at(self.pos), b'+' | b'-') {
            p.trail = Some(self.at(self.pos));
            self.pos += 1;
        }
        p
    }
}

impl Field {
    fn render(&self, val: &Val, out: &mut String) -> Result<()> {
        let text = |val: &Val| -> Result<String> {
            match val {
                Val::String(s) => Ok(crate::lang::cp437::to_string(s)),
                _ => Err(error!(TypeMismatch)),
            }
        };
        match self {
            Field::First => out.push_str(&pad(&text(val)?, 1)),
            Field::All => out.push_str(&text(val)?),
            Field::Fixed(width) => out.push_str(&pad(&text(val)?, *width)),
            Field::Number(picture) => {
                let n = f64::try_from(val.clone())?;
                out.push_str(&picture.render(n));
            }
        }
        Ok(())
    }
}

fn pad(s: &str, width: usize) -> String {
    let mut s: String = s.chars().take(width).collect();
    while s.chars().count() < width {
        s.push(' ');
    }
    s
}

fn group(digits: &str) -> String {
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Non-negative `n` with `places` decimals, halves rounded away from zero.
fn fixed(n: f64, places: usize) -> String {
    let text = format!("{}", n);
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let padded = frac.bytes().chain(std::iter::repeat(b'0')).take(places);
    let mut digits: Vec<u8> = int.bytes().chain(padded).collect();
    if frac.as_bytes().get(places).map_or(false, |d| *d >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }
    let point = digits.len() - places;
    let mut out = String::from_utf8_lossy(&digits[..point]).into_owned();
    if places > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(&digits[point..]));
    }
    out
}

impl Picture {
    fn render(&self, n: f64) -> String {
        let negative = n < 0.0;
        let (body, exp) = if self.exponent > 0 {
            self.scientific(n.abs())
        } else {
            (fixed(n.abs(), self.after), String::new())
        };
        let (int, frac) = match body.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (body, String::new()),
        };
        let sign = if self.lead_sign {
            if negative {
                "-"
            } else {
                "+"
            }
        } else if negative && self.trail.is_none() {
            "-"
        } else {
            ""
        };
        let digits = if self.comma { group(&int) } else { int };
        let mut left = format!("{}{}{}", sign, if self.dollar { "$" } else { "" }, digits);
        if left.chars().count() > self.before && digits == "0" {
            left.truncate(left.len() - 1);
        }
        let mut right = String::new();
        if self.decimal {
            right.push('.');
            right.push_str(&frac);
        }
        right.push_str(&exp);
        match self.trail {
            Some(b'+') => right.push(if negative { '-' } else { '+' }),
            Some(_) => right.push(if negative { '-' } else { ' ' }),
            None => {}
        }
        let used = left.chars().count();
        if used > self.before {
            return format!("%{}{}", left, right);
        }
        let fill = if self.fill { '*' } else { ' ' };
        let mut out: String = std::iter::repeat(fill).take(self.before - used).collect();
        out.push_str(&left);
        out.push_str(&right);
        out
    }

    /// Mantissa scaled to the digit positions, one of which is kept for
    /// the sign unless the picture places the sign itself.
    fn scientific(&self, n: f64) -> (String, String) {
        let reserve = if self.lead_sign || self.trail.is_some() { 0 } else { 1 };
        let places = self.before.saturating_sub(reserve) as i32;
        let mut exp = if n == 0.0 {
            0
        } else {
            n.log10().floor() as i32 - (places - 1)
        };
        let mut mantissa = n / 10f64.powi(exp);
        let rounded: f64 = fixed(mantissa, self.after).parse().unwrap_or(mantissa);
        if n != 0.0 && rounded >= 10f64.powi(places.max(0)) {
            exp += 1;
            mantissa = n / 10f64.powi(exp);
        }
        let body = fixed(mantissa, self.after);
        let width = self.exponent - 2;
        let e = format!(
            "E{}{:0w$}",
            if exp < 0 { '-' } else { '+' },
            exp.abs(),
            w = width
        );
        (body, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn using(f: &str, vals: &[Val]) -> String {
        format(f.as_bytes(), vals).unwrap()
    }

    #[test]
    fn test_numeric_fields() {
        assert_eq!(using("##.##", &[Val::Single(3.14159)]), " 3.14");
        assert_eq!(using("###.##", &[Val::Single(-1.5)]), " -1.50");
        assert_eq!(using("+##.#", &[Val::Integer(2)]), " +2.0");
        assert_eq!(using("##.##-", &[Val::Integer(-1)]), " 1.00-");
        assert_eq!(using("**#.#", &[Val::Integer(3)]), "**3.0");
        assert_eq!(using("$$##.##", &[Val::Single(12.5)]), " $12.50");
        assert_eq!(using("#,###", &[Val::Integer(1234)]), "1,234");
        assert_eq!(using(".##", &[Val::Single(0.5)]), ".50");
    }

    #[test]
    fn test_halves_round_away_from_zero() {
        assert_eq!(using("#", &[Val::Single(2.5)]), "3");
        assert_eq!(using("#.#", &[Val::Single(1.25)]), "1.3");
        assert_eq!(using("**#.#", &[Val::Single(1.25)]), "**1.3");
        assert_eq!(using("##.#", &[Val::Single(-0.25)]), "-0.3");
        assert_eq!(using("##", &[Val::Single(9.5)]), "10");
    }

    #[test]
    fn test_overflow_marker() {
        assert_eq!(using("##", &[Val::Integer(123)]), "%123");
    }

    #[test]
    fn test_exponent() {
        assert_eq!(using("##.##^^^^", &[Val::Single(234.56)]), " 2.35E+02");
    }

    #[test]
    fn test_string_fields() {
        let s = Val::from("ABCDEF");
        assert_eq!(using("!", &[s.clone()]), "A");
        assert_eq!(using("\\  \\", &[s.clone()]), "ABCD");
        assert_eq!(using("[&]", &[s]), "[ABCDEF]");
        assert_eq!(using("\\  \\|", &[Val::from("AB")]), "AB  |");
    }

    #[test]
    fn test_cycle_and_literals() {
        assert_eq!(
            using("X=## ", &[Val::Integer(1), Val::Integer(2)]),
            "X= 1 X= 2 "
        );
        assert_eq!(using("_##", &[Val::Integer(5)]), "#5");
        assert_eq!(using("AB ##", &[]), "AB ");
    }

    #[test]
    fn test_errors() {
        assert_eq!(format(b"NONE", &[Val::Integer(1)]).unwrap_err().code(), 5);
        assert_eq!(format(b"!", &[Val::Integer(1)]).unwrap_err().code(), 13);
        assert_eq!(format(b"#", &[Val::from("A")]).unwrap_err().code(), 13);
    }
}
