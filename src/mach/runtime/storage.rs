use super::{Flow, Result, Runtime};
use crate::error;
use crate::lang::token::{func, tok, PREFIX_FN};
use crate::lang::{cp437, Line, LineNumber, MaxValue};
use crate::mach::cursor::Cursor;
use crate::mach::file::Mode;
use crate::mach::{Program, Val};
use std::ops::RangeInclusive;
use tracing::debug;

/// First byte of a tokenized program file.
const PROTECTED: u8 = 0xFF;

/// A program file name gets `.BAS` when it has no extension.
fn program_path(name: &[u8]) -> Result<String> {
    let name = cp437::to_string(name).trim().to_string();
    if name.is_empty() {
        return Err(error!(BadFileName));
    }
    if name.contains('.') {
        Ok(name)
    } else {
        Ok(format!("{}.BAS", name))
    }
}

fn file_name(name: &[u8]) -> Result<String> {
    let name = cp437::to_string(name).trim().to_string();
    if name.is_empty() {
        return Err(error!(BadFileName));
    }
    Ok(name)
}

/// The lines of an ASCII program file.
fn ascii_lines(bytes: &[u8]) -> impl Iterator<Item = String> + '_ {
    let end = bytes.iter().position(|&b| b == 0x1A).unwrap_or(bytes.len());
    bytes[..end]
        .split(|&b| b == b'\n')
        .map(|l| cp437::to_string(l).trim_end_matches('\r').to_string())
        .filter(|l| !l.trim().is_empty())
}

fn enter_ascii(program: &mut Program, bytes: &[u8]) -> Result<()> {
    for text in ascii_lines(bytes) {
        let line = Line::new(&text)?;
        if line.is_direct() {
            return Err(error!(DirectStatementInFile));
        }
        if line.is_empty() {
            if let Some(number) = line.number() {
                program.remove(number);
            }
        } else {
            program.enter(line);
        }
    }
    Ok(())
}

impl Runtime {
    /// Replace the program with the contents of a file.
    pub(super) fn load_program(&mut self, name: &[u8]) -> Result<()> {
        let path = program_path(name)?;
        let bytes = std::fs::read(&path)?;
        let program = if bytes.first() == Some(&PROTECTED) {
            Program::deserialize(&bytes[1..])?
        } else {
            let mut program = Program::new();
            enter_ascii(&mut program, &bytes)?;
            program
        };
        debug!(path = path.as_str(), lines = program.len(), "load");
        self.program = program;
        self.cont = None;
        Ok(())
    }

    pub(super) fn load(&mut self, c: &mut Cursor) -> Result<Flow> {
        let name = self.eval_string(c)?;
        let run = if c.eat(b',') {
            if !c.word("R") {
                return Err(error!(SyntaxError));
            }
            true
        } else {
            false
        };
        self.load_program(&name)?;
        self.clear();
        if !run {
            return Ok(Flow::Halt);
        }
        match self.program.first() {
            Some(line) => Ok(Flow::Goto(line)),
            None => Ok(Flow::Halt),
        }
    }

    pub(super) fn save(&mut self, c: &mut Cursor) -> Result<Flow> {
        let path = program_path(&self.eval_string(c)?)?;
        let ascii = if c.eat(b',') {
            if c.word("A") {
                true
            } else if c.word("P") {
                false
            } else {
                return Err(error!(SyntaxError));
            }
        } else {
            false
        };
        let bytes = if ascii {
            let mut text = self.program.list(0..=LineNumber::max_value()).join("\r\n");
            text.push_str("\r\n");
            cp437::to_bytes(&text)
        } else {
            let mut bytes = vec![PROTECTED];
            bytes.extend(self.program.serialize()?);
            bytes
        };
        std::fs::write(&path, bytes)?;
        debug!(path = path.as_str(), ascii, "save");
        Ok(Flow::Next)
    }

    /// MERGE only takes ASCII files.
    pub(super) fn merge(&mut self, c: &mut Cursor) -> Result<Flow> {
        let path = program_path(&self.eval_string(c)?)?;
        let bytes = std::fs::read(&path)?;
        if bytes.first() == Some(&PROTECTED) {
            return Err(error!(BadFileMode));
        }
        enter_ascii(&mut self.program, &bytes)?;
        debug!(path = path.as_str(), "merge");
        self.var.clear();
        self.fns.clear();
        Ok(Flow::Halt)
    }

    /// `n`, `n-`, `-m` and `n-m`; nothing means every line.
    fn line_range(&mut self, c: &mut Cursor) -> Result<RangeInclusive<u16>> {
        let max = LineNumber::max_value();
        let from = c.line_ref();
        if !c.eat(tok::MINUS) && !c.eat(b'-') {
            return Ok(match from {
                Some(n) => n..=n,
                None => 0..=max,
            });
        }
        let to = c.line_ref().unwrap_or(max);
        Ok(from.unwrap_or(0)..=to)
    }

    /// LIST leaves CONT working.
    pub(super) fn list(&mut self, c: &mut Cursor) -> Result<Flow> {
        let range = self.line_range(c)?;
        if !c.at_end() {
            return Err(error!(SyntaxError));
        }
        for text in self.program.list(range) {
            self.print(&text);
            self.print("\n");
        }
        match self.stmt.line {
            Some(_) => Ok(Flow::Next),
            None => Ok(Flow::End),
        }
    }

    pub(super) fn delete(&mut self, c: &mut Cursor) -> Result<Flow> {
        if c.at_end() {
            return Err(error!(IllegalFunctionCall));
        }
        let range = self.line_range(c)?;
        self.program.delete(range)?;
        self.var.clear();
        self.fns.clear();
        Ok(Flow::Halt)
    }

    /// RENUM [new][,[old][,step]].
    pub(super) fn renum(&mut self, c: &mut Cursor) -> Result<Flow> {
        let new = c.line_ref().unwrap_or(10);
        let old = if c.eat(b',') { c.line_ref().unwrap_or(0) } else { 0 };
        let step = if c.eat(b',') {
            match c.line_ref() {
                Some(n) => n,
                None => {
                    let n = self.eval_integer(c)?;
                    if n < 1 {
                        return Err(error!(IllegalFunctionCall));
                    }
                    n as u16
                }
            }
        } else {
            10
        };
        if !c.at_end() {
            return Err(error!(SyntaxError));
        }
        for warning in self.program.renumber(new, old, step)? {
            self.print(&warning);
            self.print("\n");
        }
        self.data.restore(None);
        Ok(Flow::Halt)
    }

    pub(super) fn open(&mut self, c: &mut Cursor) -> Result<Flow> {
        let first = self.eval_string(c)?;
        let (mode, number, name, len) = if c.eat(b',') {
            let mode = Mode::from_letter(first.first().copied().unwrap_or(b' '))?;
            c.eat(b'#');
            let number = self.eval_float(c)?;
            c.expect(b',')?;
            let name = self.eval_string(c)?;
            let len = if c.eat(b',') {
                Some(self.eval_integer(c)?)
            } else {
                None
            };
            (mode, number, name, len)
        } else {
            let mode = if c.eat(tok::FOR) {
                if c.eat(tok::INPUT) {
                    Mode::Input
                } else if c.word("OUTPUT") {
                    Mode::Output
                } else if c.word("APPEND") {
                    Mode::Append
                } else if c.word("RANDOM") {
                    Mode::Random
                } else {
                    return Err(error!(SyntaxError));
                }
            } else {
                Mode::Random
            };
            if !c.word("AS") {
                return Err(error!(SyntaxError));
            }
            c.eat(b'#');
            let number = self.eval_float(c)?;
            let len = if c.eat_prefixed(PREFIX_FN, func::LEN) {
                c.expect(tok::EQUAL)?;
                Some(self.eval_integer(c)?)
            } else {
                None
            };
            (mode, number, first, len)
        };
        let len = match len {
            Some(n) if n < 1 => return Err(error!(IllegalFunctionCall)),
            Some(n) => n as usize,
            None => self.config.record_len,
        };
        let name = file_name(&name)?;
        self.files.open(number, &name, mode, len)?;
        Ok(Flow::Next)
    }

    pub(super) fn close(&mut self, c: &mut Cursor) -> Result<Flow> {
        if c.at_end() {
            self.files.close_all();
            return Ok(Flow::Next);
        }
        loop {
            c.eat(b'#');
            let number = self.eval_float(c)?;
            self.files.close(number)?;
            if !c.eat(b',') {
                break;
            }
        }
        Ok(Flow::Next)
    }

    /// FIELD #n, width AS name$, ...
    pub(super) fn field(&mut self, c: &mut Cursor) -> Result<Flow> {
        c.eat(b'#');
        let number = self.eval_float(c)?;
        let mut defs = vec![];
        while c.eat(b',') {
            let width = self.eval_integer(c)?;
            if !(0..=255).contains(&width) {
                return Err(error!(IllegalFunctionCall));
            }
            if !c.word("AS") {
                return Err(error!(SyntaxError));
            }
            let name = c.expect_identifier()?;
            if !self.var.type_of(&name).is_string() {
                return Err(error!(TypeMismatch));
            }
            defs.push((width as usize, name));
        }
        let handle = self.files.get(number)?;
        for def in handle.field(defs)? {
            let bytes = handle.field_bytes(&def);
            self.var.store(&def.name, Val::String(bytes))?;
        }
        Ok(Flow::Next)
    }

    /// LSET and RSET pad a value to the width of its field.
    pub(super) fn set_field_var(&mut self, c: &mut Cursor, right: bool) -> Result<Flow> {
        let target = self.lvalue(c)?;
        c.expect(tok::EQUAL)?;
        let mut val = self.eval_string(c)?;
        let width = match self.files.field_width(&target.name) {
            Some(width) if target.subscripts.is_none() => width,
            _ => match self.fetch(&target)? {
                Val::String(s) => s.len(),
                _ => return Err(error!(TypeMismatch)),
            },
        };
        val.truncate(width);
        let pad = vec![b' '; width - val.len()];
        let bytes = if right {
            [pad, val].concat()
        } else {
            [val, pad].concat()
        };
        if target.subscripts.is_some() {
            self.store(&target, Val::String(bytes))?;
            return Ok(Flow::Next);
        }
        let changed = self.files.set_field(&target.name, &bytes);
        if changed.is_empty() {
            self.store(&target, Val::String(bytes))?;
        }
        for (name, contents) in changed {
            self.var.store(&name, Val::String(contents))?;
        }
        Ok(Flow::Next)
    }

    fn record_args(&mut self, c: &mut Cursor) -> Result<(f64, Option<f64>)> {
        c.eat(b'#');
        let number = self.eval_float(c)?;
        let record = if c.eat(b',') {
            Some(self.eval_float(c)?)
        } else {
            None
        };
        Ok((number, record))
    }

    pub(super) fn get(&mut self, c: &mut Cursor) -> Result<Flow> {
        if matches!(c.peek(), b'(' | tok::STEP) {
            return self.graphics_get(c);
        }
        let (number, record) = self.record_args(c)?;
        let handle = self.files.get(number)?;
        handle.get(record)?;
        for def in handle.fields().to_vec() {
            let bytes = handle.field_bytes(&def);
            self.var.store(&def.name, Val::String(bytes))?;
        }
        Ok(Flow::Next)
    }

    pub(super) fn put(&mut self, c: &mut Cursor) -> Result<Flow> {
        if matches!(c.peek(), b'(' | tok::STEP) {
            return self.graphics_put(c);
        }
        let (number, record) = self.record_args(c)?;
        self.files.get(number)?.put(record)?;
        Ok(Flow::Next)
    }

    pub(super) fn bsave(&mut self, c: &mut Cursor) -> Result<Flow> {
        let name = file_name(&self.eval_string(c)?)?;
        c.expect(b',')?;
        let offset = self.eval_float(c)?;
        c.expect(b',')?;
        let len = self.eval_float(c)?;
        let image = self.memory.bsave(offset, len)?;
        std::fs::write(&name, image)?;
        Ok(Flow::Next)
    }

    pub(super) fn bload(&mut self, c: &mut Cursor) -> Result<Flow> {
        let name = file_name(&self.eval_string(c)?)?;
        let offset = if c.eat(b',') {
            Some(self.eval_float(c)?)
        } else {
            None
        };
        let image = std::fs::read(&name)?;
        self.memory.bload(&image, offset)?;
        Ok(Flow::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_path() {
        assert_eq!(program_path(b"GAME").unwrap(), "GAME.BAS");
        assert_eq!(program_path(b" data.txt ").unwrap(), "data.txt");
        assert_eq!(program_path(b"").unwrap_err().code(), 64);
    }

    #[test]
    fn test_enter_ascii() {
        let mut program = Program::new();
        enter_ascii(&mut program, b"20 PRINT 2\r\n10 PRINT 1\r\n\r\n\x1A").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.first(), Some(10));
        enter_ascii(&mut program, b"20\n").unwrap();
        assert_eq!(program.len(), 1);
        let err = enter_ascii(&mut program, b"PRINT 3\n").unwrap_err();
        assert_eq!(err.code(), 66);
    }
}
