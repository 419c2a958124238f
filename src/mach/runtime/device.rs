use super::{Flow, Result, Runtime};
use crate::error;
use crate::lang::token::tok;
use crate::mach::cursor::Cursor;
use crate::mach::{draw, play, Host, PixelBuffer, PutAction, Val};
use std::convert::TryFrom;
use std::f64::consts::PI;

/// Graphics statements need a screen mode with a pixel buffer.
fn canvas(host: &mut dyn Host) -> Result<&mut PixelBuffer> {
    host.graphics_buffer()
        .ok_or_else(|| error!(IllegalFunctionCall))
}

fn color_arg(arg: Option<Val>, default: u8) -> Result<u8> {
    match arg {
        None => Ok(default),
        Some(val) => {
            let n = i16::try_from(val)?;
            if (0..=255).contains(&n) {
                Ok(n as u8)
            } else {
                Err(error!(IllegalFunctionCall))
            }
        }
    }
}

fn float_arg(arg: Option<Val>) -> Result<Option<f64>> {
    arg.map(f64::try_from).transpose()
}

impl Runtime {
    /// `[STEP](x, y)`, relative to the pen after STEP.
    fn coord(&mut self, c: &mut Cursor) -> Result<(i32, i32)> {
        let relative = c.eat(tok::STEP);
        c.expect(b'(')?;
        let x = self.eval_float(c)?;
        c.expect(b',')?;
        let y = self.eval_float(c)?;
        c.expect(b')')?;
        let (x, y) = (x.round() as i32, y.round() as i32);
        if relative {
            Ok((self.pen.x + x, self.pen.y + y))
        } else {
            Ok((x, y))
        }
    }

    fn dash(c: &mut Cursor) -> Result<()> {
        if c.eat(tok::MINUS) || c.eat(b'-') {
            Ok(())
        } else {
            Err(error!(SyntaxError))
        }
    }

    /// PSET draws in the foreground color by default, PRESET in the
    /// background.
    pub(super) fn pset(&mut self, c: &mut Cursor, foreground: bool) -> Result<Flow> {
        let (x, y) = self.coord(c)?;
        let arg = if c.eat(b',') { Some(self.eval(c)?) } else { None };
        let default = if foreground { self.pen.color } else { 0 };
        let color = color_arg(arg, default)?;
        canvas(self.host.as_mut())?.pset(x, y, color);
        self.pen.x = x;
        self.pen.y = y;
        Ok(Flow::Next)
    }

    /// LINE [from]-to [,[color][,B|BF][,style]]
    pub(super) fn line(&mut self, c: &mut Cursor) -> Result<Flow> {
        let from = if matches!(c.peek(), b'(' | tok::STEP) {
            self.coord(c)?
        } else {
            (self.pen.x, self.pen.y)
        };
        Runtime::dash(c)?;
        self.pen.x = from.0;
        self.pen.y = from.1;
        let to = self.coord(c)?;
        let mut color = None;
        let (mut boxed, mut filled) = (false, false);
        if c.eat(b',') {
            if c.peek() != b',' && !c.at_end() {
                color = Some(self.eval(c)?);
            }
            if c.eat(b',') {
                if c.word("BF") {
                    filled = true;
                } else if c.word("B") {
                    boxed = true;
                }
                if c.eat(b',') {
                    self.eval_integer(c)?;
                }
            }
        }
        let color = color_arg(color, self.pen.color)?;
        let buf = canvas(self.host.as_mut())?;
        if filled {
            buf.fill_rect(from.0, from.1, to.0, to.1, color);
        } else if boxed {
            buf.rect(from.0, from.1, to.0, to.1, color);
        } else {
            buf.line(from.0, from.1, to.0, to.1, color);
        }
        self.pen.x = to.0;
        self.pen.y = to.1;
        Ok(Flow::Next)
    }

    /// CIRCLE (x, y), r [,color [,start [,end [,aspect]]]]
    pub(super) fn circle(&mut self, c: &mut Cursor) -> Result<Flow> {
        let (cx, cy) = self.coord(c)?;
        c.expect(b',')?;
        let r = self.eval_float(c)?;
        let mut args = if c.eat(b',') {
            self.optional_args(c)?
        } else {
            vec![]
        };
        if args.len() > 4 {
            return Err(error!(SyntaxError));
        }
        args.resize(4, None);
        let mut args = args.into_iter();
        let color = color_arg(args.next().flatten(), self.pen.color)?;
        let start = float_arg(args.next().flatten())?;
        let end = float_arg(args.next().flatten())?;
        let aspect = float_arg(args.next().flatten())?.unwrap_or(1.0);
        for angle in start.iter().chain(end.iter()) {
            if angle.abs() > 2.0 * PI {
                return Err(error!(IllegalFunctionCall));
            }
        }
        let (rx, ry) = if aspect < 1.0 {
            (r, r * aspect)
        } else {
            (r / aspect, r)
        };
        let buf = canvas(self.host.as_mut())?;
        if start.is_none() && end.is_none() && (rx - ry).abs() < f64::EPSILON {
            buf.circle(cx, cy, r.round() as i32, color);
        } else {
            buf.arc(
                cx,
                cy,
                rx,
                ry,
                start.unwrap_or(0.0),
                end.unwrap_or(2.0 * PI),
                color,
            );
        }
        self.pen.x = cx;
        self.pen.y = cy;
        Ok(Flow::Next)
    }

    /// PAINT (x, y) [,fill [,border]]. A string fill uses its first byte.
    pub(super) fn paint(&mut self, c: &mut Cursor) -> Result<Flow> {
        let (x, y) = self.coord(c)?;
        let mut args = if c.eat(b',') {
            self.optional_args(c)?
        } else {
            vec![]
        };
        if args.len() > 3 {
            return Err(error!(SyntaxError));
        }
        args.resize(3, None);
        let mut args = args.into_iter();
        let fill = match args.next().flatten() {
            Some(Val::String(s)) => *s.first().ok_or_else(|| error!(IllegalFunctionCall))?,
            arg => color_arg(arg, self.pen.color)?,
        };
        let border = color_arg(args.next().flatten(), fill)?;
        canvas(self.host.as_mut())?.paint(x, y, fill, border);
        self.pen.x = x;
        self.pen.y = y;
        Ok(Flow::Next)
    }

    pub(super) fn draw(&mut self, c: &mut Cursor) -> Result<Flow> {
        let commands = self.eval_string(c)?;
        let Runtime { host, pen, var, .. } = self;
        let buf = canvas(host.as_mut())?;
        let mut lookup = |name: &[u8]| -> Result<Val> { Ok(var.fetch(name)) };
        draw::draw(&commands, pen, buf, &mut lookup)?;
        Ok(Flow::Next)
    }

    pub(super) fn play(&mut self, c: &mut Cursor) -> Result<Flow> {
        let commands = self.eval_string(c)?;
        let Runtime {
            host, music, var, ..
        } = self;
        let mut lookup = |name: &[u8]| -> Result<Val> { Ok(var.fetch(name)) };
        play::play(&commands, music, &mut lookup, &mut |freq: f64, ms: f64| {
            host.sound(freq, ms)
        })?;
        Ok(Flow::Next)
    }

    /// SOUND freq, ticks. A tick is 1/18.2 of a second.
    pub(super) fn sound(&mut self, c: &mut Cursor) -> Result<Flow> {
        let freq = self.eval_float(c)?;
        c.expect(b',')?;
        let ticks = self.eval_float(c)?;
        if !(freq == 0.0 || (37.0..=32767.0).contains(&freq)) || !(0.0..=65535.0).contains(&ticks) {
            return Err(error!(IllegalFunctionCall));
        }
        self.host.sound(freq, ticks * 1000.0 / 18.2);
        Ok(Flow::Next)
    }

    /// GET (x1, y1)-(x2, y2), array
    pub(super) fn graphics_get(&mut self, c: &mut Cursor) -> Result<Flow> {
        let from = self.coord(c)?;
        Runtime::dash(c)?;
        let to = self.coord(c)?;
        c.expect(b',')?;
        let name = c.expect_identifier()?;
        c.skip_parens()?;
        let block = canvas(self.host.as_mut())?.get(from.0, from.1, to.0, to.1)?;
        self.var.set_array_bytes(&name, &block)?;
        Ok(Flow::Next)
    }

    /// PUT (x, y), array [,action]
    pub(super) fn graphics_put(&mut self, c: &mut Cursor) -> Result<Flow> {
        let (x, y) = self.coord(c)?;
        c.expect(b',')?;
        let name = c.expect_identifier()?;
        c.skip_parens()?;
        let action = if c.eat(b',') {
            match c.take() {
                tok::PSET => PutAction::Pset,
                tok::PRESET => PutAction::Preset,
                tok::AND => PutAction::And,
                tok::OR => PutAction::Or,
                tok::XOR => PutAction::Xor,
                _ => return Err(error!(SyntaxError)),
            }
        } else {
            PutAction::Xor
        };
        let block = self.var.array_bytes(&name)?;
        canvas(self.host.as_mut())?.put(x, y, &block, action)?;
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_arg() {
        assert_eq!(color_arg(None, 3).unwrap(), 3);
        assert_eq!(color_arg(Some(Val::Integer(2)), 3).unwrap(), 2);
        assert_eq!(color_arg(Some(Val::Integer(300)), 3).unwrap_err().code(), 5);
        assert_eq!(color_arg(Some(Val::from("A")), 3).unwrap_err().code(), 13);
    }
}
