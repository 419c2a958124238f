use super::{Flow, Result, Runtime};
use crate::error;
use crate::lang::token::{self, func, tok, xstmt, EOL, PREFIX_FN, PREFIX_XSTMT};
use crate::lang::{Error, LineNumber, Type};
use crate::mach::cursor::Cursor;
use crate::mach::event::{Trap, TrapState};
use crate::mach::format;
use crate::mach::stack::{ForFrame, GosubFrame, TextPos, WhileFrame};
use crate::mach::userfn::UserFn;
use crate::mach::{Operation, Val};
use std::convert::TryFrom;
use std::time::Instant;
use tracing::debug;

/// An assignment target: a scalar, or an array element with its
/// subscripts already evaluated.
pub(super) struct LValue {
    pub name: Vec<u8>,
    pub subscripts: Option<Vec<i16>>,
}

fn loop_continues(val: &Val, limit: &Val, step: &Val) -> Result<bool> {
    let (val, limit, step) = (val.to_f64()?, limit.to_f64()?, step.to_f64()?);
    Ok(if step >= 0.0 { val <= limit } else { val >= limit })
}

impl Runtime {
    /// Execute the statement at the cursor.
    pub(super) fn statement(&mut self, c: &mut Cursor) -> Result<Flow> {
        let b = c.peek();
        match (b, c.peek_second()) {
            (PREFIX_XSTMT, xstmt::TIMER) | (PREFIX_XSTMT, xstmt::COM) => {
                return self.trap_switch(c)
            }
            (PREFIX_XSTMT, xstmt::PLAY) => {
                let mut probe = c.clone();
                probe.advance(2);
                if matches!(probe.peek(), tok::ON | tok::OFF | tok::STOP) {
                    return self.trap_switch(c);
                }
            }
            (PREFIX_FN, func::PEN) | (PREFIX_FN, func::STRIG) => return self.trap_switch(c),
            (PREFIX_FN, func::MID) => return self.mid_assign(c),
            (tok::KEY, _) => {
                let mut probe = c.clone();
                probe.advance(1);
                if probe.peek() == b'(' {
                    return self.trap_switch(c);
                }
            }
            _ => {}
        }
        if b == PREFIX_XSTMT {
            let index = c.peek_second();
            c.advance(2);
            return self.extended(index, c);
        }
        if !token::is_statement(b) {
            self.assign(c)?;
            return Ok(Flow::Next);
        }
        c.advance(1);
        match b {
            tok::END => {
                self.files.close_all();
                Ok(Flow::End)
            }
            tok::FOR => self.r#for(c),
            tok::NEXT => self.next(c),
            tok::DATA => {
                c.set_pos(token::data_end(c.bytes(), c.pos()));
                Ok(Flow::Next)
            }
            tok::INPUT => self.input(c),
            tok::DIM => self.dim(c),
            tok::READ => self.read(c),
            tok::LET => {
                self.assign(c)?;
                Ok(Flow::Next)
            }
            tok::GOTO => Ok(Flow::Goto(c.expect_line_ref()?)),
            tok::RUN => self.run(c),
            tok::IF => self.r#if(c),
            tok::RESTORE => {
                self.data.restore(c.line_ref());
                Ok(Flow::Next)
            }
            tok::GOSUB => {
                let line = c.expect_line_ref()?;
                self.gosub(c, line)
            }
            tok::RETURN => self.r#return(c),
            tok::REM | tok::ELSE => {
                c.skip_line();
                Ok(Flow::Next)
            }
            tok::STOP => Ok(Flow::Stop(TextPos::new(self.stmt.line, c.pos()))),
            tok::PRINT | tok::LPRINT => self.print_statement(c),
            tok::CLEAR => {
                self.optional_args(c)?;
                self.clear();
                Ok(Flow::Next)
            }
            tok::LIST | tok::LLIST => self.list(c),
            tok::NEW => {
                self.program.clear();
                self.clear();
                Ok(Flow::Halt)
            }
            tok::ON => self.on(c),
            tok::WAIT | tok::OUT => {
                self.optional_args(c)?;
                Ok(Flow::Next)
            }
            tok::DEF => self.def(c),
            tok::POKE => {
                let addr = self.eval_float(c)?;
                c.expect(b',')?;
                let val = self.eval_integer(c)?;
                self.memory.poke(addr, val)?;
                Ok(Flow::Next)
            }
            tok::CONT => match self.cont.take() {
                Some(at) => Ok(Flow::Jump(at)),
                None => Err(error!(CantContinue)),
            },
            tok::WIDTH => self.width(c),
            tok::TRON => {
                self.tron = true;
                Ok(Flow::Next)
            }
            tok::TROFF => {
                self.tron = false;
                Ok(Flow::Next)
            }
            tok::SWAP => self.swap(c),
            tok::ERASE => {
                loop {
                    let name = c.expect_identifier()?;
                    self.var.erase(&name)?;
                    if !c.eat(b',') {
                        break;
                    }
                }
                Ok(Flow::Next)
            }
            tok::ERROR => {
                let n = self.eval_integer(c)?;
                if !(1..=255).contains(&n) {
                    return Err(error!(IllegalFunctionCall));
                }
                Err(Error::from_code(n as u16))
            }
            tok::RESUME => self.resume(c),
            tok::DELETE => self.delete(c),
            tok::RENUM => self.renum(c),
            tok::DEFSTR => self.deftype(c, Type::String),
            tok::DEFINT => self.deftype(c, Type::Integer),
            tok::DEFSNG => self.deftype(c, Type::Single),
            tok::DEFDBL => self.deftype(c, Type::Double),
            tok::LINE => {
                if c.eat(tok::INPUT) {
                    self.line_input(c)
                } else {
                    self.line(c)
                }
            }
            tok::WHILE => self.r#while(c),
            tok::WEND => match self.whiles.last() {
                Some(frame) => Ok(Flow::Jump(frame.start)),
                None => Err(error!(WendWithoutWhile)),
            },
            tok::WRITE => self.write(c),
            tok::OPTION => {
                if !c.word("BASE") {
                    return Err(error!(SyntaxError));
                }
                let base = self.eval_integer(c)?;
                self.var.option_base(base)?;
                Ok(Flow::Next)
            }
            tok::RANDOMIZE => self.randomize(c),
            tok::OPEN => self.open(c),
            tok::CLOSE => self.close(c),
            tok::LOAD => self.load(c),
            tok::MERGE => self.merge(c),
            tok::SAVE => self.save(c),
            tok::COLOR => self.color(c),
            tok::CLS => self.cls(c),
            tok::SCREEN => self.screen(c),
            tok::KEY => self.key(c),
            tok::LOCATE => self.locate(c),
            tok::BSAVE => self.bsave(c),
            tok::BLOAD => self.bload(c),
            tok::SOUND => self.sound(c),
            tok::BEEP => {
                self.host.sound(800.0, 250.0);
                Ok(Flow::Next)
            }
            tok::PSET => self.pset(c, true),
            tok::PRESET => self.pset(c, false),
            tok::EDIT | tok::AUTO | tok::CALL | tok::MOTOR => Err(error!(AdvancedFeature)),
            _ => Err(error!(SyntaxError)),
        }
    }

    fn extended(&mut self, index: u8, c: &mut Cursor) -> Result<Flow> {
        match index {
            xstmt::SYSTEM => Ok(Flow::Quit),
            xstmt::FIELD => self.field(c),
            xstmt::LSET => self.set_field_var(c, false),
            xstmt::RSET => self.set_field_var(c, true),
            xstmt::GET => self.get(c),
            xstmt::PUT => self.put(c),
            xstmt::RESET => {
                self.files.close_all();
                Ok(Flow::Next)
            }
            xstmt::DATE | xstmt::TIME => {
                c.expect(tok::EQUAL)?;
                self.eval_string(c)?;
                Ok(Flow::Next)
            }
            xstmt::PAINT => self.paint(c),
            xstmt::CIRCLE => self.circle(c),
            xstmt::DRAW => self.draw(c),
            xstmt::PLAY => self.play(c),
            _ => Err(error!(AdvancedFeature)),
        }
    }

    pub(super) fn lvalue(&mut self, c: &mut Cursor) -> Result<LValue> {
        let name = c.expect_identifier()?;
        let subscripts = if c.peek() == b'(' {
            Some(self.eval_subscripts(c)?)
        } else {
            None
        };
        Ok(LValue { name, subscripts })
    }

    pub(super) fn fetch(&mut self, target: &LValue) -> Result<Val> {
        match &target.subscripts {
            Some(subscripts) => self.var.fetch_element(&target.name, subscripts),
            None => Ok(self.var.fetch(&target.name)),
        }
    }

    pub(super) fn store(&mut self, target: &LValue, val: Val) -> Result<()> {
        if self.var.type_of(&target.name).is_string() != val.is_string() {
            return Err(error!(TypeMismatch));
        }
        match &target.subscripts {
            Some(subscripts) => self.var.store_element(&target.name, subscripts, val),
            None => self.var.store(&target.name, val),
        }
    }

    fn assign(&mut self, c: &mut Cursor) -> Result<()> {
        let target = self.lvalue(c)?;
        c.expect(tok::EQUAL)?;
        let val = self.eval(c)?;
        self.store(&target, val)
    }

    /// `MID$(v$, start[, len]) = s$` overwrites in place and never
    /// changes the length of `v$`.
    fn mid_assign(&mut self, c: &mut Cursor) -> Result<Flow> {
        c.advance(2);
        c.expect(b'(')?;
        let target = self.lvalue(c)?;
        c.expect(b',')?;
        let start = self.eval_integer(c)?;
        let len = if c.eat(b',') {
            Some(self.eval_integer(c)?)
        } else {
            None
        };
        c.expect(b')')?;
        c.expect(tok::EQUAL)?;
        let replacement = self.eval_string(c)?;
        let mut s = match self.fetch(&target)? {
            Val::String(s) => s,
            _ => return Err(error!(TypeMismatch)),
        };
        if start < 1 || start as usize > s.len() || len.map_or(false, |n| !(0..=255).contains(&n)) {
            return Err(error!(IllegalFunctionCall));
        }
        let start = start as usize - 1;
        let n = len
            .map_or(replacement.len(), |n| n as usize)
            .min(replacement.len())
            .min(s.len() - start);
        s[start..start + n].copy_from_slice(&replacement[..n]);
        self.store(&target, Val::String(s))?;
        Ok(Flow::Next)
    }

    fn swap(&mut self, c: &mut Cursor) -> Result<Flow> {
        let a = self.lvalue(c)?;
        c.expect(b',')?;
        let b = self.lvalue(c)?;
        let va = self.fetch(&a)?;
        let vb = self.fetch(&b)?;
        if va.ty() != vb.ty() {
            return Err(error!(TypeMismatch));
        }
        self.store(&a, vb)?;
        self.store(&b, va)?;
        Ok(Flow::Next)
    }

    fn dim(&mut self, c: &mut Cursor) -> Result<Flow> {
        loop {
            let name = c.expect_identifier()?;
            let upper = self.eval_subscripts(c)?;
            self.var.dimension(&name, &upper)?;
            if !c.eat(b',') {
                break;
            }
        }
        Ok(Flow::Next)
    }

    fn deftype(&mut self, c: &mut Cursor, ty: Type) -> Result<Flow> {
        let letter = |c: &mut Cursor| -> Result<u8> {
            match c.expect_identifier()?.as_slice() {
                [l] => Ok(*l),
                _ => Err(error!(SyntaxError)),
            }
        };
        loop {
            let from = letter(c)?;
            let to = if c.eat(tok::MINUS) { letter(c)? } else { from };
            self.var.set_default_type(from, to, ty)?;
            if !c.eat(b',') {
                break;
            }
        }
        Ok(Flow::Next)
    }

    fn def(&mut self, c: &mut Cursor) -> Result<Flow> {
        if c.eat(tok::FN) {
            let (name, f) = UserFn::parse(c)?;
            let (key, ty) = self.var.key(&name);
            self.fns.define(key, ty, f)?;
        } else if c.word("SEG") {
            let segment = if c.eat(tok::EQUAL) {
                Some(self.eval_float(c)?)
            } else {
                None
            };
            self.memory.def_seg(segment)?;
        } else if c.eat(tok::USR) {
            return Err(error!(AdvancedFeature));
        } else {
            return Err(error!(SyntaxError));
        }
        Ok(Flow::Next)
    }

    fn read(&mut self, c: &mut Cursor) -> Result<Flow> {
        loop {
            let target = self.lvalue(c)?;
            let datum = self.data.read(&self.program)?;
            let val = if self.var.type_of(&target.name).is_string() {
                Val::String(datum.bytes)
            } else {
                let bad = || error!(SyntaxError, Some(datum.line));
                if datum.quoted {
                    return Err(bad());
                }
                format::parse(&datum.bytes).ok_or_else(bad)?
            };
            self.store(&target, val)?;
            if !c.eat(b',') {
                break;
            }
        }
        Ok(Flow::Next)
    }

    fn randomize(&mut self, c: &mut Cursor) -> Result<Flow> {
        let seed = if c.at_end() {
            loop {
                let answer = match self.host.input("Random number seed (-32768 to 32767)? ") {
                    Some(answer) => answer,
                    None => return Ok(Flow::Stop(self.stmt)),
                };
                self.col = 0;
                match format::parse(answer.as_bytes()) {
                    Some(val) => break f64::try_from(val)?,
                    None => self.print("?Redo from start\n"),
                }
            }
        } else {
            self.eval_float(c)?
        };
        self.random.randomize(seed);
        Ok(Flow::Next)
    }

    fn run(&mut self, c: &mut Cursor) -> Result<Flow> {
        if let Some(line) = c.line_ref() {
            self.clear();
            return Ok(Flow::Goto(line));
        }
        if !c.at_end() {
            let name = self.eval_string(c)?;
            if c.eat(b',') && !c.word("R") {
                return Err(error!(SyntaxError));
            }
            self.load_program(&name)?;
        }
        self.clear();
        debug!(lines = self.program.len(), "run");
        match self.program.first() {
            Some(line) => Ok(Flow::Goto(line)),
            None => Ok(Flow::Halt),
        }
    }

    fn r#if(&mut self, c: &mut Cursor) -> Result<Flow> {
        let cond = self.eval(c)?.truth()?;
        c.eat(b',');
        let then = match c.peek() {
            tok::THEN => true,
            tok::GOTO => false,
            _ => return Err(error!(SyntaxError)),
        };
        c.advance(1);
        if cond {
            if let Some(line) = c.line_ref() {
                return Ok(Flow::Goto(line));
            }
            if !then {
                return Err(error!(SyntaxError));
            }
            return Ok(Flow::Jump(TextPos::new(self.stmt.line, c.pos())));
        }
        let mut depth = 0;
        loop {
            match c.peek() {
                EOL => return Ok(Flow::Jump(TextPos::new(self.stmt.line, c.pos()))),
                tok::IF => depth += 1,
                tok::ELSE if depth == 0 => {
                    c.advance(1);
                    if let Some(line) = c.line_ref() {
                        return Ok(Flow::Goto(line));
                    }
                    return Ok(Flow::Jump(TextPos::new(self.stmt.line, c.pos())));
                }
                tok::ELSE => depth -= 1,
                _ => {}
            }
            c.skip_token();
        }
    }

    fn r#for(&mut self, c: &mut Cursor) -> Result<Flow> {
        let name = c.expect_identifier()?;
        let (key, ty) = self.var.key(&name);
        if ty.is_string() {
            return Err(error!(TypeMismatch));
        }
        c.expect(tok::EQUAL)?;
        let start = self.eval_numeric(c)?;
        c.expect(tok::TO)?;
        let limit = self.eval_numeric(c)?.coerce(ty)?;
        let step = if c.eat(tok::STEP) {
            self.eval_numeric(c)?
        } else {
            Val::Integer(1)
        }
        .coerce(ty)?;
        if !c.at_end() {
            return Err(error!(SyntaxError));
        }
        self.var.store(&name, start)?;
        if let Some(i) = self.fors.rposition(|f| f.key == key) {
            self.fors.truncate(i);
        }
        if loop_continues(&self.var.fetch(&name), &limit, &step)? {
            self.fors.push(ForFrame {
                var: name,
                key,
                limit,
                step,
                body: TextPos::new(self.stmt.line, c.pos()),
            })?;
            return Ok(Flow::Next);
        }
        self.skip_for(c)
    }

    fn eval_numeric(&mut self, c: &mut Cursor) -> Result<Val> {
        let val = self.eval(c)?;
        if val.is_string() {
            return Err(error!(TypeMismatch));
        }
        Ok(val)
    }

    fn next(&mut self, c: &mut Cursor) -> Result<Flow> {
        loop {
            let name = c.identifier();
            if let Some(name) = &name {
                let key = self.var.key(name).0;
                if !matches!(self.fors.last(), Some(frame) if frame.key == key) {
                    return Err(error!(NextWithoutFor));
                }
            }
            let frame = match self.fors.last() {
                Some(frame) => frame.clone(),
                None => return Err(error!(NextWithoutFor)),
            };
            let val = Operation::sum(self.var.fetch(&frame.var), frame.step.clone())?;
            self.var.store(&frame.var, val)?;
            if loop_continues(&self.var.fetch(&frame.var), &frame.limit, &frame.step)? {
                return Ok(Flow::Jump(frame.body));
            }
            self.fors.pop();
            if name.is_none() || !c.eat(b',') {
                return Ok(Flow::Next);
            }
        }
    }

    /// Step to the first statement at or after the cursor, moving on
    /// through the following program lines. False at the program's end.
    fn statement_start(&self, c: &mut Cursor, line: &mut LineNumber) -> Result<bool> {
        loop {
            while c.eat(b':') {}
            if c.peek() != EOL {
                return Ok(true);
            }
            match line.and_then(|n| self.program.next_line(n)) {
                Some(n) => {
                    *line = Some(n);
                    *c = Cursor::new(self.line_bytes(*line)?, 0);
                }
                None => return Ok(false),
            }
        }
    }

    /// From one statement to the next. THEN and ELSE start statements.
    fn advance_statement(&self, c: &mut Cursor, line: &mut LineNumber) -> Result<bool> {
        loop {
            let b = c.peek();
            if b == b':' || b == EOL {
                break;
            }
            c.skip_token();
            if b == tok::THEN || b == tok::ELSE {
                return Ok(true);
            }
        }
        self.statement_start(c, line)
    }

    /// A loop that runs zero times: continue after its NEXT.
    fn skip_for(&mut self, c: &mut Cursor) -> Result<Flow> {
        let mut line = self.stmt.line;
        let mut c = c.clone();
        let mut depth = 0usize;
        if !self.statement_start(&mut c, &mut line)? {
            return Err(error!(ForWithoutNext));
        }
        loop {
            match c.peek() {
                tok::FOR => depth += 1,
                tok::NEXT => {
                    let mut probe = c.clone();
                    probe.advance(1);
                    if probe.at_end() {
                        if depth == 0 {
                            return Ok(Flow::Jump(TextPos::new(line, probe.pos())));
                        }
                        depth -= 1;
                    } else {
                        loop {
                            probe.expect_identifier()?;
                            if depth == 0 {
                                if probe.eat(b',') {
                                    return match self.next(&mut probe)? {
                                        Flow::Next => {
                                            Ok(Flow::Jump(TextPos::new(line, probe.pos())))
                                        }
                                        flow => Ok(flow),
                                    };
                                }
                                return Ok(Flow::Jump(TextPos::new(line, probe.pos())));
                            }
                            depth -= 1;
                            if !probe.eat(b',') {
                                break;
                            }
                        }
                    }
                }
                _ => {}
            }
            if !self.advance_statement(&mut c, &mut line)? {
                return Err(error!(ForWithoutNext));
            }
        }
    }

    fn r#while(&mut self, c: &mut Cursor) -> Result<Flow> {
        let start = self.stmt;
        let cond = self.eval(c)?.truth()?;
        let top = matches!(self.whiles.last(), Some(frame) if frame.start == start);
        if cond {
            if !top {
                self.whiles.push(WhileFrame { start })?;
            }
            return Ok(Flow::Next);
        }
        if top {
            self.whiles.pop();
        }
        let mut line = self.stmt.line;
        let mut c = c.clone();
        let mut depth = 0usize;
        if !self.statement_start(&mut c, &mut line)? {
            return Err(error!(WhileWithoutWend));
        }
        loop {
            match c.peek() {
                tok::WHILE => depth += 1,
                tok::WEND if depth == 0 => {
                    c.advance(1);
                    return Ok(Flow::Jump(TextPos::new(line, c.pos())));
                }
                tok::WEND => depth -= 1,
                _ => {}
            }
            if !self.advance_statement(&mut c, &mut line)? {
                return Err(error!(WhileWithoutWend));
            }
        }
    }

    fn gosub(&mut self, c: &mut Cursor, line: u16) -> Result<Flow> {
        if !self.program.contains(line) {
            return Err(error!(UndefinedLine));
        }
        self.gosubs.push(GosubFrame {
            ret: TextPos::new(self.stmt.line, c.pos()),
            trap: None,
            for_depth: self.fors.len(),
            while_depth: self.whiles.len(),
        })?;
        Ok(Flow::Goto(line))
    }

    fn r#return(&mut self, c: &mut Cursor) -> Result<Flow> {
        let frame = self
            .gosubs
            .pop()
            .ok_or_else(|| error!(ReturnWithoutGosub))?;
        self.fors.truncate(frame.for_depth);
        self.whiles.truncate(frame.while_depth);
        if let Some(trap) = frame.trap {
            self.traps.rearm(trap);
        }
        match c.line_ref() {
            Some(line) => Ok(Flow::Goto(line)),
            None => Ok(Flow::Jump(frame.ret)),
        }
    }

    fn on(&mut self, c: &mut Cursor) -> Result<Flow> {
        if c.eat(tok::ERROR) {
            c.expect(tok::GOTO)?;
            let line = c.expect_line_ref()?;
            if line == 0 {
                self.on_error = None;
                if let Some(frame) = self.errors.last() {
                    return Err(frame.error.clone());
                }
                return Ok(Flow::Next);
            }
            if !self.program.contains(line) {
                return Err(error!(UndefinedLine));
            }
            self.on_error = Some(line);
            return Ok(Flow::Next);
        }
        let event = match (c.peek(), c.peek_second()) {
            (tok::KEY, _) => true,
            (PREFIX_XSTMT, index) => matches!(index, xstmt::TIMER | xstmt::COM | xstmt::PLAY),
            (PREFIX_FN, index) => matches!(index, func::PEN | func::STRIG),
            _ => false,
        };
        if event {
            let trap = self.trap_source(c)?;
            match trap {
                Trap::Timer => {
                    c.expect(b'(')?;
                    let seconds = self.eval_float(c)?;
                    c.expect(b')')?;
                    if seconds <= 0.0 || seconds > 86400.0 {
                        return Err(error!(IllegalFunctionCall));
                    }
                    self.traps.set_timer_interval(seconds);
                }
                Trap::Play => {
                    if c.eat(b'(') {
                        self.eval_integer(c)?;
                        c.expect(b')')?;
                    }
                }
                _ => {}
            }
            c.expect(tok::GOSUB)?;
            let line = c.expect_line_ref()?;
            let handler = match line {
                0 => None,
                n if self.program.contains(n) => Some(n),
                _ => return Err(error!(UndefinedLine)),
            };
            self.traps.set_handler(trap, handler);
            return Ok(Flow::Next);
        }
        let n = self.eval_float(c)?.round();
        if !(0.0..=255.0).contains(&n) {
            return Err(error!(IllegalFunctionCall));
        }
        let gosub = if c.eat(tok::GOSUB) {
            true
        } else if c.eat(tok::GOTO) {
            false
        } else {
            return Err(error!(SyntaxError));
        };
        let mut lines = vec![c.expect_line_ref()?];
        while c.eat(b',') {
            lines.push(c.expect_line_ref()?);
        }
        let n = n as usize;
        if n == 0 || n > lines.len() {
            return Ok(Flow::Next);
        }
        if gosub {
            self.gosub(c, lines[n - 1])
        } else {
            Ok(Flow::Goto(lines[n - 1]))
        }
    }

    /// KEY(n), TIMER, COM(n), PEN, STRIG(n) or PLAY at the cursor.
    fn trap_source(&mut self, c: &mut Cursor) -> Result<Trap> {
        let number = |rt: &mut Runtime, c: &mut Cursor, max: i16| -> Result<u8> {
            c.expect(b'(')?;
            let n = rt.eval_integer(c)?;
            c.expect(b')')?;
            if !(0..=max).contains(&n) {
                return Err(error!(IllegalFunctionCall));
            }
            Ok(n as u8)
        };
        if c.eat(tok::KEY) {
            Ok(Trap::Key(number(self, c, 20)?))
        } else if c.eat_prefixed(PREFIX_XSTMT, xstmt::TIMER) {
            Ok(Trap::Timer)
        } else if c.eat_prefixed(PREFIX_XSTMT, xstmt::COM) {
            Ok(Trap::Com(number(self, c, 2)?))
        } else if c.eat_prefixed(PREFIX_XSTMT, xstmt::PLAY) {
            Ok(Trap::Play)
        } else if c.eat_prefixed(PREFIX_FN, func::PEN) {
            Ok(Trap::Pen)
        } else if c.eat_prefixed(PREFIX_FN, func::STRIG) {
            Ok(Trap::Strig(number(self, c, 7)?))
        } else {
            Err(error!(SyntaxError))
        }
    }

    /// `KEY(n) ON`, `TIMER OFF`, `PEN STOP` and the like.
    fn trap_switch(&mut self, c: &mut Cursor) -> Result<Flow> {
        let trap = self.trap_source(c)?;
        let state = if c.eat(tok::ON) {
            TrapState::On
        } else if c.eat(tok::OFF) {
            TrapState::Off
        } else if c.eat(tok::STOP) {
            TrapState::Stopped
        } else {
            return Err(error!(SyntaxError));
        };
        debug!(?trap, ?state, "trap");
        self.traps.set_state(trap, state, Instant::now());
        Ok(Flow::Next)
    }

    fn resume(&mut self, c: &mut Cursor) -> Result<Flow> {
        let frame = self
            .errors
            .pop()
            .ok_or_else(|| error!(ResumeWithoutError))?;
        if c.eat(tok::NEXT) {
            return Ok(Flow::Jump(frame.next));
        }
        match c.line_ref() {
            None | Some(0) => Ok(Flow::Jump(frame.at)),
            Some(line) => Ok(Flow::Goto(line)),
        }
    }
}
