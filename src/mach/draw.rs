use super::{PixelBuffer, Val};
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

const MAX_NESTING: usize = 16;

/// The graphics pen: last point referenced, drawing color, and the
/// DRAW scale and rotation.
#[derive(Debug, Clone)]
pub struct Pen {
    pub x: i32,
    pub y: i32,
    pub color: u8,
    scale: i32,
    turn: i32,
}

impl Pen {
    pub fn new(width: usize, height: usize) -> Pen {
        Pen {
            x: width as i32 / 2,
            y: height as i32 / 2,
            color: 3,
            scale: 4,
            turn: 0,
        }
    }
}

/// ## DRAW
///
/// `lookup` resolves the variables named by `X` and `=` arguments.
pub fn draw(
    commands: &[u8],
    pen: &mut Pen,
    buf: &mut PixelBuffer,
    lookup: &mut dyn FnMut(&[u8]) -> Result<Val>,
) -> Result<()> {
    let mut d = Draw {
        pen,
        buf,
        lookup,
        depth: 0,
    };
    d.run(commands)
}

struct Draw<'a> {
    pen: &'a mut Pen,
    buf: &'a mut PixelBuffer,
    lookup: &'a mut dyn FnMut(&[u8]) -> Result<Val>,
    depth: usize,
}

struct Scan<'s> {
    src: &'s [u8],
    pos: usize,
}

impl<'s> Scan<'s> {
    fn skip(&mut self) {
        while matches!(self.src.get(self.pos), Some(b' ') | Some(b';')) {
            self.pos += 1;
        }
    }

    fn next(&mut self) -> Option<u8> {
        self.skip();
        let c = self.src.get(self.pos)?.to_ascii_uppercase();
        self.pos += 1;
        Some(c)
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip();
        self.src.get(self.pos).map(u8::to_ascii_uppercase)
    }

    /// A variable name up to the terminating `;`.
    fn name(&mut self) -> Result<Vec<u8>> {
        self.skip();
        let start = self.pos;
        while let Some(&c) = self.src.get(self.pos) {
            if c == b';' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(error!(IllegalFunctionCall));
        }
        let name = self.src[start..self.pos].to_ascii_uppercase();
        self.pos += 1;
        Ok(name)
    }
}

impl<'a> Draw<'a> {
    fn run(&mut self, commands: &[u8]) -> Result<()> {
        let mut s = Scan {
            src: commands,
            pos: 0,
        };
        let mut blank = false;
        let mut no_update = false;
        while let Some(c) = s.next() {
            match c {
                b'B' => {
                    blank = true;
                    continue;
                }
                b'N' => {
                    no_update = true;
                    continue;
                }
                b'U' | b'D' | b'L' | b'R' | b'E' | b'F' | b'G' | b'H' => {
                    let n = self.optional(&mut s, 1.0)?;
                    let (dx, dy) = match c {
                        b'U' => (0.0, -1.0),
                        b'D' => (0.0, 1.0),
                        b'L' => (-1.0, 0.0),
                        b'R' => (1.0, 0.0),
                        b'E' => (1.0, -1.0),
                        b'F' => (1.0, 1.0),
                        b'G' => (-1.0, 1.0),
                        _ => (-1.0, -1.0),
                    };
                    let k = n * self.pen.scale as f64 / 4.0;
                    let (dx, dy) = self.rotate(dx * k, dy * k);
                    let to = (self.pen.x + dx.round() as i32, self.pen.y + dy.round() as i32);
                    self.stroke(to, blank, no_update);
                }
                b'M' => {
                    let relative = matches!(s.peek(), Some(b'+') | Some(b'-'));
                    let x = self.number(&mut s)?;
                    if s.next() != Some(b',') {
                        return Err(error!(IllegalFunctionCall));
                    }
                    let y = self.number(&mut s)?;
                    let to = if relative {
                        let k = self.pen.scale as f64 / 4.0;
                        (
                            self.pen.x + (x * k).round() as i32,
                            self.pen.y + (y * k).round() as i32,
                        )
                    } else {
                        (x as i32, y as i32)
                    };
                    self.stroke(to, blank, no_update);
                }
                b'A' => {
                    let n = self.number(&mut s)?;
                    if !(0.0..=3.0).contains(&n) {
                        return Err(error!(IllegalFunctionCall));
                    }
                    self.pen.turn = n as i32 * 90;
                }
                b'T' => {
                    if s.next() != Some(b'A') {
                        return Err(error!(IllegalFunctionCall));
                    }
                    let n = self.number(&mut s)?;
                    if !(-360.0..=360.0).contains(&n) {
                        return Err(error!(IllegalFunctionCall));
                    }
                    self.pen.turn = n as i32;
                }
                b'C' => {
                    let n = self.number(&mut s)?;
                    if !(0.0..=255.0).contains(&n) {
                        return Err(error!(IllegalFunctionCall));
                    }
                    self.pen.color = n as u8;
                }
                b'S' => {
                    let n = self.number(&mut s)?;
                    if !(1.0..=255.0).contains(&n) {
                        return Err(error!(IllegalFunctionCall));
                    }
                    self.pen.scale = n as i32;
                }
                b'P' => {
                    let fill = self.number(&mut s)?;
                    if s.next() != Some(b',') {
                        return Err(error!(IllegalFunctionCall));
                    }
                    let border = self.number(&mut s)?;
                    self.buf
                        .paint(self.pen.x, self.pen.y, fill as u8, border as u8);
                }
                b'X' => {
                    let name = s.name()?;
                    let sub = Vec::<u8>::try_from((self.lookup)(&name)?)?;
                    if self.depth >= MAX_NESTING {
                        return Err(error!(IllegalFunctionCall));
                    }
                    self.depth += 1;
                    let result = self.run(&sub);
                    self.depth -= 1;
                    result?;
                }
                _ => return Err(error!(IllegalFunctionCall)),
            }
            blank = false;
            no_update = false;
        }
        Ok(())
    }

    fn rotate(&self, x: f64, y: f64) -> (f64, f64) {
        if self.pen.turn == 0 {
            return (x, y);
        }
        let (sin, cos) = (self.pen.turn as f64).to_radians().sin_cos();
        (x * cos + y * sin, -x * sin + y * cos)
    }

    fn stroke(&mut self, to: (i32, i32), blank: bool, no_update: bool) {
        if !blank {
            self.buf.line(self.pen.x, self.pen.y, to.0, to.1, self.pen.color);
        }
        if !no_update {
            self.pen.x = to.0;
            self.pen.y = to.1;
        }
    }

    fn optional(&mut self, s: &mut Scan, default: f64) -> Result<f64> {
        match s.peek() {
            Some(c) if c.is_ascii_digit() || c == b'=' || c == b'+' || c == b'-' => self.number(s),
            _ => Ok(default),
        }
    }

    /// A signed decimal number, or `=name;` for a variable's value.
    fn number(&mut self, s: &mut Scan) -> Result<f64> {
        s.skip();
        let mut sign = 1.0;
        match s.src.get(s.pos) {
            Some(b'+') => s.pos += 1,
            Some(b'-') => {
                sign = -1.0;
                s.pos += 1;
            }
            _ => {}
        }
        if s.src.get(s.pos) == Some(&b'=') {
            s.pos += 1;
            let name = s.name()?;
            return Ok(sign * f64::try_from((self.lookup)(&name)?)?);
        }
        let start = s.pos;
        while matches!(s.src.get(s.pos), Some(c) if c.is_ascii_digit()) {
            s.pos += 1;
        }
        std::str::from_utf8(&s.src[start..s.pos])
            .ok()
            .and_then(|t| t.parse::<f64>().ok())
            .map(|n| sign * n)
            .ok_or_else(|| error!(IllegalFunctionCall))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(commands: &str, pen: &mut Pen, buf: &mut PixelBuffer) -> Result<()> {
        let mut lookup = |name: &[u8]| -> Result<Val> {
            match name {
                b"SQ$" => Ok(Val::from("R4D4L4U4")),
                b"LOOP$" => Ok(Val::from("XLOOP$;")),
                b"N" => Ok(Val::Integer(6)),
                _ => Ok(Val::from("")),
            }
        };
        draw(commands.as_bytes(), pen, buf, &mut lookup)
    }

    #[test]
    fn test_moves_and_blank() {
        let mut buf = PixelBuffer::new(40, 40);
        let mut pen = Pen::new(40, 40);
        pen.x = 10;
        pen.y = 10;
        run("C2 BR2 R3 ND2 E1", &mut pen, &mut buf).unwrap();
        assert_eq!(buf.point(11, 10), Some(0));
        assert_eq!(buf.point(12, 10), Some(2));
        assert_eq!(buf.point(15, 10), Some(2));
        assert_eq!(buf.point(15, 12), Some(2));
        assert_eq!((pen.x, pen.y), (16, 9));
    }

    #[test]
    fn test_scale_angle_and_absolute() {
        let mut buf = PixelBuffer::new(40, 40);
        let mut pen = Pen::new(40, 40);
        run("BM5,5 S8 A1 U2", &mut pen, &mut buf).unwrap();
        assert_eq!((pen.x, pen.y), (1, 5));
        run("S4 A0 M+=N;,0", &mut pen, &mut buf).unwrap();
        assert_eq!((pen.x, pen.y), (11, 5));
    }

    #[test]
    fn test_substrings() {
        let mut buf = PixelBuffer::new(40, 40);
        let mut pen = Pen::new(40, 40);
        pen.x = 0;
        pen.y = 0;
        run("C1 XSQ$;", &mut pen, &mut buf).unwrap();
        assert_eq!(buf.point(4, 4), Some(1));
        assert_eq!((pen.x, pen.y), (0, 0));
        assert_eq!(run("XLOOP$;", &mut pen, &mut buf).unwrap_err().code(), 5);
        assert_eq!(run("Q", &mut pen, &mut buf).unwrap_err().code(), 5);
    }
}
