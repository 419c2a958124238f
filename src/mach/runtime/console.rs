use super::{Flow, Result, Runtime};
use crate::error;
use crate::lang::cp437;
use crate::lang::token::tok;
use crate::mach::cursor::Cursor;
use crate::mach::draw::Pen;
use crate::mach::{format, using, Val};
use std::convert::TryFrom;

/// Where PRINT and WRITE output goes.
#[derive(Debug, Clone, Copy)]
enum Sink {
    Console,
    File(f64),
}

/// Split an INPUT reply on commas outside quotes. Quoted fields are
/// flagged so numeric targets can reject them.
fn split_fields(line: &[u8]) -> Vec<(Vec<u8>, bool)> {
    let mut fields = vec![];
    let mut i = 0;
    loop {
        while line.get(i) == Some(&b' ') {
            i += 1;
        }
        if line.get(i) == Some(&b'"') {
            i += 1;
            let start = i;
            while i < line.len() && line[i] != b'"' {
                i += 1;
            }
            fields.push((line[start..i].to_vec(), true));
            while i < line.len() && line[i] != b',' {
                i += 1;
            }
        } else {
            let start = i;
            while i < line.len() && line[i] != b',' {
                i += 1;
            }
            fields.push((format::trim(&line[start..i]).to_vec(), false));
        }
        if i < line.len() {
            i += 1;
        } else {
            break;
        }
    }
    fields
}

impl Runtime {
    /// Console output with cursor tracking.
    pub(super) fn print(&mut self, text: &str) {
        for ch in text.chars() {
            match ch {
                '\n' => {
                    self.col = 0;
                    self.row = (self.row + 1).min(24);
                }
                '\r' => self.col = 0,
                _ => {
                    self.col += 1;
                    if self.col >= self.width {
                        self.col = 0;
                        self.row = (self.row + 1).min(24);
                    }
                }
            }
        }
        self.host.print(text);
    }

    fn sink(&mut self, c: &mut Cursor) -> Result<Sink> {
        if c.eat(b'#') {
            let n = self.eval_float(c)?;
            c.expect(b',')?;
            return Ok(Sink::File(n));
        }
        Ok(Sink::Console)
    }

    fn emit(&mut self, sink: Sink, text: &str) -> Result<()> {
        match sink {
            Sink::Console => {
                self.print(text);
                Ok(())
            }
            Sink::File(n) => self.files.get(n)?.write(&cp437::to_bytes(text)),
        }
    }

    fn newline(&mut self, sink: Sink) -> Result<()> {
        match sink {
            Sink::Console => self.emit(sink, "\n"),
            Sink::File(_) => self.emit(sink, "\r\n"),
        }
    }

    fn sink_col(&mut self, sink: Sink) -> Result<usize> {
        match sink {
            Sink::Console => Ok(self.col),
            Sink::File(n) => Ok(self.files.get(n)?.col()),
        }
    }

    fn sink_width(&self, sink: Sink) -> usize {
        match sink {
            Sink::Console => self.width,
            Sink::File(_) => 255,
        }
    }

    /// PRINT and LPRINT. The printer is the console.
    pub(super) fn print_statement(&mut self, c: &mut Cursor) -> Result<Flow> {
        let sink = self.sink(c)?;
        if c.eat(tok::USING) {
            return self.print_using(c, sink);
        }
        let zone = self.config.print_zone;
        let width = self.sink_width(sink);
        let mut newline = true;
        while !c.at_end() {
            newline = true;
            match c.peek() {
                b';' => {
                    c.advance(1);
                    newline = false;
                }
                b',' => {
                    c.advance(1);
                    newline = false;
                    let col = self.sink_col(sink)?;
                    let next = (col / zone + 1) * zone;
                    if next >= width {
                        self.newline(sink)?;
                    } else {
                        self.emit(sink, &" ".repeat(next - col))?;
                    }
                }
                tok::TAB => {
                    c.advance(1);
                    let n = self.eval_integer(c)?;
                    c.expect(b')')?;
                    if n > 255 {
                        return Err(error!(IllegalFunctionCall));
                    }
                    let target = (n.max(1) as usize - 1) % width;
                    let col = self.sink_col(sink)?;
                    if target < col {
                        self.newline(sink)?;
                        self.emit(sink, &" ".repeat(target))?;
                    } else {
                        self.emit(sink, &" ".repeat(target - col))?;
                    }
                }
                tok::SPC => {
                    c.advance(1);
                    let n = self.eval_integer(c)?;
                    c.expect(b')')?;
                    if n > 255 {
                        return Err(error!(IllegalFunctionCall));
                    }
                    self.emit(sink, &" ".repeat(n.max(0) as usize % width))?;
                }
                _ => {
                    let text = match self.eval(c)? {
                        Val::String(s) => cp437::to_string(&s),
                        val => format!("{} ", format::number(&val)),
                    };
                    let col = self.sink_col(sink)?;
                    if col > 0 && col + text.chars().count() > width {
                        self.newline(sink)?;
                    }
                    self.emit(sink, &text)?;
                }
            }
        }
        if newline {
            self.newline(sink)?;
        }
        Ok(Flow::Next)
    }

    fn print_using(&mut self, c: &mut Cursor, sink: Sink) -> Result<Flow> {
        let template = self.eval_string(c)?;
        if !c.eat(b';') {
            c.expect(b',')?;
        }
        let mut values = vec![];
        let mut newline = true;
        while !c.at_end() {
            values.push(self.eval(c)?);
            newline = true;
            if c.eat(b';') || c.eat(b',') {
                newline = false;
            } else {
                break;
            }
        }
        let text = using::format(&template, &values)?;
        self.emit(sink, &text)?;
        if newline {
            self.newline(sink)?;
        }
        Ok(Flow::Next)
    }

    pub(super) fn write(&mut self, c: &mut Cursor) -> Result<Flow> {
        let sink = self.sink(c)?;
        let mut items = vec![];
        while !c.at_end() {
            items.push(match self.eval(c)? {
                Val::String(s) => format!("\"{}\"", cp437::to_string(&s)),
                val => format::number(&val).trim_start().to_string(),
            });
            if !c.eat(b',') && !c.eat(b';') {
                break;
            }
        }
        self.emit(sink, &items.join(","))?;
        self.newline(sink)?;
        Ok(Flow::Next)
    }

    fn input_value(&self, name: &[u8], field: (Vec<u8>, bool)) -> Option<Val> {
        let (bytes, quoted) = field;
        if self.var.type_of(name).is_string() {
            Some(Val::String(bytes))
        } else if quoted {
            None
        } else {
            format::parse(&bytes)
        }
    }

    /// INPUT from the keyboard or a file. A reply with the wrong number
    /// of fields, or text where a number belongs, is asked for again.
    pub(super) fn input(&mut self, c: &mut Cursor) -> Result<Flow> {
        if c.eat(b'#') {
            let n = self.eval_float(c)?;
            c.expect(b',')?;
            loop {
                let target = self.lvalue(c)?;
                let field = self.files.get(n)?.read_field()?;
                let val = self
                    .input_value(&target.name, field)
                    .ok_or_else(|| error!(TypeMismatch))?;
                self.store(&target, val)?;
                if !c.eat(b',') {
                    break;
                }
            }
            return Ok(Flow::Next);
        }
        c.eat(b';');
        let mut prompt = String::new();
        let mut question = true;
        if let Some(s) = c.string() {
            prompt = cp437::to_string(&s);
            if c.eat(b',') {
                question = false;
            } else {
                c.expect(b';')?;
            }
        }
        if question {
            prompt.push_str("? ");
        }
        let start = c.pos();
        let mut names = vec![];
        loop {
            names.push(c.expect_identifier()?);
            c.skip_parens()?;
            if !c.eat(b',') {
                break;
            }
        }
        if !c.at_end() {
            return Err(error!(SyntaxError));
        }
        loop {
            let reply = match self.host.input(&prompt) {
                Some(reply) => reply,
                None => return Ok(Flow::Stop(self.stmt)),
            };
            self.col = 0;
            let fields = split_fields(&cp437::to_bytes(&reply));
            let values: Option<Vec<Val>> = if fields.len() == names.len() {
                names
                    .iter()
                    .zip(fields)
                    .map(|(name, field)| self.input_value(name, field))
                    .collect()
            } else {
                None
            };
            match values {
                Some(values) => {
                    c.set_pos(start);
                    for val in values {
                        let target = self.lvalue(c)?;
                        self.store(&target, val)?;
                        c.eat(b',');
                    }
                    return Ok(Flow::Next);
                }
                None => self.print("?Redo from start\n"),
            }
        }
    }

    pub(super) fn line_input(&mut self, c: &mut Cursor) -> Result<Flow> {
        if c.eat(b'#') {
            let n = self.eval_float(c)?;
            c.expect(b',')?;
            let target = self.lvalue(c)?;
            let line = self.files.get(n)?.read_line()?;
            self.store(&target, Val::String(line))?;
            return Ok(Flow::Next);
        }
        c.eat(b';');
        let prompt = match c.string() {
            Some(s) => {
                if !c.eat(b';') {
                    c.expect(b',')?;
                }
                cp437::to_string(&s)
            }
            None => String::new(),
        };
        let target = self.lvalue(c)?;
        if !self.var.type_of(&target.name).is_string() {
            return Err(error!(TypeMismatch));
        }
        let reply = match self.host.input(&prompt) {
            Some(reply) => reply,
            None => return Ok(Flow::Stop(self.stmt)),
        };
        self.col = 0;
        self.store(&target, Val::String(cp437::to_bytes(&reply)))?;
        Ok(Flow::Next)
    }

    pub(super) fn cls(&mut self, c: &mut Cursor) -> Result<Flow> {
        if !c.at_end() {
            self.eval_integer(c)?;
        }
        if !self.host.cls() {
            return Err(error!(IllegalFunctionCall));
        }
        if let Some(buf) = self.host.graphics_buffer() {
            buf.clear(0);
        }
        self.col = 0;
        self.row = 0;
        Ok(Flow::Next)
    }

    /// Up to `max` optional integer arguments; -1 for each one left out.
    fn integer_args(&mut self, c: &mut Cursor, max: usize) -> Result<Vec<i16>> {
        let args = self.optional_args(c)?;
        if args.len() > max {
            return Err(error!(SyntaxError));
        }
        let mut out = vec![-1; max];
        for (i, arg) in args.into_iter().enumerate() {
            if let Some(val) = arg {
                out[i] = i16::try_from(val)?;
            }
        }
        Ok(out)
    }

    pub(super) fn locate(&mut self, c: &mut Cursor) -> Result<Flow> {
        let n = self.integer_args(c, 5)?;
        let (row, col) = (n[0], n[1]);
        if (row != -1 && !(1..=25).contains(&row))
            || (col != -1 && !(1..=self.width as i16).contains(&col))
        {
            return Err(error!(IllegalFunctionCall));
        }
        if !self.host.locate(row, col, n[2], n[3], n[4]) {
            return Err(error!(IllegalFunctionCall));
        }
        if row > 0 {
            self.row = row as usize - 1;
        }
        if col > 0 {
            self.col = col as usize - 1;
        }
        Ok(Flow::Next)
    }

    pub(super) fn color(&mut self, c: &mut Cursor) -> Result<Flow> {
        let n = self.integer_args(c, 3)?;
        if !self.host.color(n[0], n[1]) {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(Flow::Next)
    }

    /// WIDTH for the screen; device and file widths are accepted and
    /// ignored.
    pub(super) fn width(&mut self, c: &mut Cursor) -> Result<Flow> {
        if matches!(c.peek(), b'#' | b'"') {
            c.skip_statement();
            return Ok(Flow::Next);
        }
        let n = self.integer_args(c, 2)?;
        if n[0] < 1 || !self.host.width(n[0]) {
            return Err(error!(IllegalFunctionCall));
        }
        self.width = n[0] as usize;
        self.col = 0;
        Ok(Flow::Next)
    }

    pub(super) fn screen(&mut self, c: &mut Cursor) -> Result<Flow> {
        let n = self.integer_args(c, 4)?;
        if n[0] != -1 && !self.host.screen_mode(n[0]) {
            return Err(error!(IllegalFunctionCall));
        }
        if let Some(buf) = self.host.graphics_buffer() {
            self.pen = Pen::new(buf.width(), buf.height());
        }
        self.col = 0;
        self.row = 0;
        Ok(Flow::Next)
    }

    /// Soft keys: `KEY n, text`, `KEY LIST`, `KEY ON` and `KEY OFF`.
    pub(super) fn key(&mut self, c: &mut Cursor) -> Result<Flow> {
        if c.eat(tok::ON) || c.eat(tok::OFF) {
            return Ok(Flow::Next);
        }
        if c.eat(tok::LIST) {
            let listing: Vec<String> = self
                .soft_keys
                .iter()
                .enumerate()
                .map(|(i, k)| format!("F{} {}\n", i + 1, cp437::to_string(k)))
                .collect();
            for line in listing {
                self.print(&line);
            }
            return Ok(Flow::Next);
        }
        let n = self.eval_integer(c)?;
        c.expect(b',')?;
        let mut text = self.eval_string(c)?;
        if !(1..=self.soft_keys.len() as i16).contains(&n) {
            return Err(error!(IllegalFunctionCall));
        }
        text.truncate(15);
        self.soft_keys[n as usize - 1] = text;
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fields() {
        assert_eq!(
            split_fields(b" 1, \"A, B\" ,XY "),
            vec![
                (b"1".to_vec(), false),
                (b"A, B".to_vec(), true),
                (b"XY".to_vec(), false)
            ]
        );
        assert_eq!(split_fields(b""), vec![(vec![], false)]);
        assert_eq!(split_fields(b"1,").len(), 2);
    }
}
