use super::cursor::Cursor;
use super::data::DataManager;
use super::draw::Pen;
use super::event::{Trap, Traps};
use super::expr::{self, Context};
use super::file::Files;
use super::function::Random;
use super::memory::Memory;
use super::play::Music;
use super::stack::{ErrorFrame, ForFrame, GosubFrame, Stack, TextPos, WhileFrame};
use super::userfn::UserFns;
use super::{Config, Host, Program, Val, Var};
use crate::error;
use crate::lang::token::{func, tok, xfunc, xstmt, Code, EOL, PREFIX_FN, PREFIX_XFN, PREFIX_XSTMT};
use crate::lang::{cp437, Error, Line, LineNumber};
use chrono::Timelike;
use std::collections::VecDeque;
use std::convert::TryFrom;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

mod console;
mod device;
mod dispatch;
mod storage;

type Result<T> = std::result::Result<T, Error>;

/// ## Events
///
/// What `execute` reports back to the host loop.
#[derive(Debug, PartialEq)]
pub enum Event {
    /// Nothing left to run; the host should read another line.
    Stopped,
    /// The cycle budget ran out with work remaining.
    Running,
    /// An untrapped error ended execution. It has already been sent to
    /// `Host::error`.
    Errored(Error),
    /// SYSTEM was executed.
    Quit,
}

/// Where execution goes after a statement.
#[derive(Debug)]
enum Flow {
    /// On to whatever follows the statement.
    Next,
    Jump(TextPos),
    Goto(u16),
    /// END: back to command level, CONT may resume after it.
    End,
    /// STOP or a break: print the break message, CONT resumes at `TextPos`.
    Stop(TextPos),
    /// Back to command level with nothing to continue.
    Halt,
    Quit,
}

/// ## Runtime
///
/// Interprets crunched lines directly. A direct line entered at the
/// prompt and the stored program are walked by the same statement
/// dispatcher; `pc` says which line and byte comes next.
pub struct Runtime {
    host: Box<dyn Host>,
    config: Config,
    program: Program,
    direct: VecDeque<Rc<[u8]>>,
    direct_line: Rc<[u8]>,
    pc: Option<TextPos>,
    stmt: TextPos,
    cont: Option<TextPos>,
    var: Var,
    fns: UserFns,
    data: DataManager,
    files: Files,
    fors: Stack<ForFrame>,
    gosubs: Stack<GosubFrame>,
    whiles: Stack<WhileFrame>,
    errors: Stack<ErrorFrame>,
    traps: Traps,
    on_error: Option<u16>,
    err: u16,
    erl: u16,
    memory: Memory,
    pen: Pen,
    music: Music,
    random: Random,
    col: usize,
    row: usize,
    width: usize,
    soft_keys: Vec<Vec<u8>>,
    tron: bool,
    stop: Arc<AtomicBool>,
}

impl Runtime {
    pub fn new(host: Box<dyn Host>) -> Runtime {
        Runtime::with_config(host, Config::default())
    }

    pub fn with_config(mut host: Box<dyn Host>, config: Config) -> Runtime {
        let pen = match host.graphics_buffer() {
            Some(buf) => Pen::new(buf.width(), buf.height()),
            None => Pen::new(0, 0),
        };
        let depth = config.stack_depth;
        Runtime {
            host,
            program: Program::new(),
            direct: VecDeque::new(),
            direct_line: Rc::from(vec![EOL]),
            pc: None,
            stmt: TextPos::new(None, 0),
            cont: None,
            var: Var::new(config.string_space),
            fns: UserFns::default(),
            data: DataManager::new(),
            files: Files::new(config.max_files),
            fors: Stack::new("FOR LOOPS NESTED TOO DEEPLY").with_limit(depth),
            gosubs: Stack::new("GOSUBS NESTED TOO DEEPLY").with_limit(depth),
            whiles: Stack::new("WHILE LOOPS NESTED TOO DEEPLY").with_limit(depth),
            errors: Stack::new("ERROR HANDLERS NESTED TOO DEEPLY").with_limit(depth),
            traps: Traps::default(),
            on_error: None,
            err: 0,
            erl: 0,
            memory: Memory::new(config.memory_size),
            pen,
            music: Music::default(),
            random: Random::default(),
            col: 0,
            row: 0,
            width: config.width,
            soft_keys: vec![vec![]; 10],
            tron: false,
            stop: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Accept one line typed at the prompt. Numbered lines edit the
    /// program; anything else is queued to run. Returns false when the
    /// line was rejected or blank.
    pub fn enter(&mut self, s: &str) -> bool {
        let line = match Line::new(s) {
            Ok(line) => line,
            Err(error) => {
                self.host.error(&error);
                return false;
            }
        };
        match line.number() {
            None => {
                if line.is_empty() {
                    return false;
                }
                self.direct.push_back(line.into_bytes().into());
            }
            Some(number) => {
                if line.is_empty() {
                    self.program.remove(number);
                } else {
                    self.program.enter(line);
                }
                self.cont = None;
                self.var.clear();
                self.fns.clear();
            }
        }
        true
    }

    /// Run at most `cycles` statements.
    pub fn execute(&mut self, cycles: usize) -> Event {
        for _ in 0..cycles {
            let at = match self.pc {
                Some(at) => at,
                None => match self.direct.pop_front() {
                    Some(bytes) => {
                        self.direct_line = bytes;
                        self.pc = Some(TextPos::new(None, 0));
                        continue;
                    }
                    None => return Event::Stopped,
                },
            };
            if self.stop.swap(false, Ordering::SeqCst) {
                self.stmt = at;
                self.brk(at);
                self.direct.clear();
                return Event::Stopped;
            }
            let flow = match self.step(at) {
                Ok(flow) => flow,
                Err(error) => match self.fault(error) {
                    Some(event) => return event,
                    None => continue,
                },
            };
            match flow {
                Flow::Next => {}
                Flow::Jump(to) => self.pc = Some(to),
                Flow::Goto(line) => {
                    if !self.program.contains(line) {
                        if let Some(event) = self.fault(error!(UndefinedLine)) {
                            return event;
                        }
                        continue;
                    }
                    self.pc = Some(TextPos::start_of(line));
                }
                Flow::End => {
                    if self.stmt.line.is_some() {
                        self.cont = self.pc;
                    }
                    self.pc = None;
                }
                Flow::Stop(resume) => self.brk(resume),
                Flow::Halt => {
                    self.pc = None;
                    self.cont = None;
                }
                Flow::Quit => {
                    self.pc = None;
                    self.files.close_all();
                    return Event::Quit;
                }
            }
        }
        Event::Running
    }

    /// Setting the flag breaks into the running program at the next
    /// statement, as Ctrl-Break does.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// A key press, light pen or similar event from the host.
    pub fn raise_event(&mut self, trap: Trap) {
        self.traps.raise(trap);
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    fn brk(&mut self, resume: TextPos) {
        match self.stmt.line {
            Some(line) => self.print(&format!("Break in {}\n", line)),
            None => self.print("Break\n"),
        }
        self.cont = Some(resume);
        self.pc = None;
    }

    fn line_bytes(&self, line: LineNumber) -> Result<Rc<[u8]>> {
        match line {
            None => Ok(self.direct_line.clone()),
            Some(n) => self.program.get(n).ok_or_else(|| error!(UndefinedLine)),
        }
    }

    /// Run the statement at `at`, or move past a line's end.
    fn step(&mut self, at: TextPos) -> Result<Flow> {
        self.stmt = at;
        let mut c = Cursor::new(self.line_bytes(at.line)?, at.pos);
        while c.eat(b':') {}
        if matches!(c.peek(), EOL | tok::ELSE | tok::APOSTROPHE) {
            return self.next_line(at.line);
        }
        if let Some(line) = at.line {
            self.traps.poll_timer(Instant::now());
            if let Some((trap, handler)) = self.traps.take_pending() {
                debug!(?trap, handler, "event trap");
                self.gosubs.push(GosubFrame {
                    ret: at,
                    trap: Some(trap),
                    for_depth: self.fors.len(),
                    while_depth: self.whiles.len(),
                })?;
                return Ok(Flow::Goto(handler));
            }
            if at.pos == 0 {
                trace!(line);
                if self.tron {
                    self.print(&format!("[{}]", line));
                }
            }
        }
        self.stmt = TextPos::new(at.line, c.pos());
        let flow = self.statement(&mut c)?;
        if let Flow::Next = flow {
            if !c.at_end() {
                return Err(error!(SyntaxError));
            }
        }
        self.pc = Some(TextPos::new(at.line, c.pos()));
        Ok(flow)
    }

    fn next_line(&mut self, line: LineNumber) -> Result<Flow> {
        let next = line.and_then(|n| self.program.next_line(n));
        match next {
            Some(n) => {
                self.pc = Some(TextPos::start_of(n));
                Ok(Flow::Next)
            }
            None => {
                if line.is_some() && !self.errors.is_empty() {
                    return Err(error!(NoResume));
                }
                self.pc = None;
                Ok(Flow::Next)
            }
        }
    }

    /// Trap the error with ON ERROR or stop with it.
    fn fault(&mut self, error: Error) -> Option<Event> {
        let at = self.stmt;
        let error = error.in_line_number(at.line);
        self.err = error.code();
        self.erl = at.line.unwrap_or(0);
        if let (Some(handler), Some(_)) = (self.on_error, at.line) {
            if self.errors.is_empty() && self.program.contains(handler) {
                let bytes = match self.line_bytes(at.line) {
                    Ok(bytes) => bytes,
                    Err(_) => return self.halt(error),
                };
                let mut c = Cursor::new(bytes.clone(), at.pos);
                let resume = if in_branch(Cursor::new(bytes, 0), at.pos) {
                    c.skip_line();
                    TextPos::new(at.line, 0)
                } else {
                    c.skip_statement();
                    at
                };
                let frame = ErrorFrame {
                    error,
                    at: resume,
                    next: TextPos::new(at.line, c.pos()),
                };
                debug!(code = self.err, line = self.erl, handler, "error trapped");
                if self.errors.push(frame).is_ok() {
                    self.pc = Some(TextPos::start_of(handler));
                    return None;
                }
                return self.halt(error!(OutOfMemory));
            }
        }
        self.halt(error)
    }

    fn halt(&mut self, error: Error) -> Option<Event> {
        debug!(%error, "halt");
        if self.col > 0 {
            self.host.print("\n");
            self.col = 0;
        }
        self.host.error(&error);
        self.errors.clear();
        self.pc = None;
        self.cont = None;
        self.direct.clear();
        Some(Event::Errored(error))
    }

    /// Everything RUN, CLEAR, NEW and LOAD reset.
    fn clear(&mut self) {
        self.var.clear();
        self.fns.clear();
        self.fors.clear();
        self.gosubs.clear();
        self.whiles.clear();
        self.errors.clear();
        self.data.restore(None);
        self.traps.clear();
        self.files.close_all();
        self.on_error = None;
        self.err = 0;
        self.erl = 0;
        self.cont = None;
    }

    fn clock() -> u64 {
        chrono::Utc::now().timestamp_millis() as u64
    }

    fn eval(&mut self, c: &mut Cursor) -> Result<Val> {
        expr::expression(c, self)
    }

    fn eval_float(&mut self, c: &mut Cursor) -> Result<f64> {
        expr::float(c, self)
    }

    fn eval_integer(&mut self, c: &mut Cursor) -> Result<i16> {
        expr::integer(c, self)
    }

    fn eval_string(&mut self, c: &mut Cursor) -> Result<Vec<u8>> {
        expr::string(c, self)
    }

    fn eval_subscripts(&mut self, c: &mut Cursor) -> Result<Vec<i16>> {
        expr::subscripts(c, self)
    }

    /// Comma separated arguments any of which may be left out.
    fn optional_args(&mut self, c: &mut Cursor) -> Result<Vec<Option<Val>>> {
        let mut args = vec![];
        loop {
            if c.at_end() {
                break;
            }
            if c.eat(b',') {
                args.push(None);
                continue;
            }
            args.push(Some(self.eval(c)?));
            if !c.eat(b',') {
                break;
            }
            if c.at_end() {
                args.push(None);
            }
        }
        Ok(args)
    }
}

impl Context for Runtime {
    fn variable(&mut self, name: &[u8]) -> Result<Val> {
        Ok(self.var.fetch(name))
    }

    fn element(&mut self, name: &[u8], subscripts: &[i16]) -> Result<Val> {
        self.var.fetch_element(name, subscripts)
    }

    /// Parameters shadow variables of the same name for the duration of
    /// the call and are restored afterwards, error or not.
    fn call(&mut self, name: &[u8], args: Vec<Val>) -> Result<Val> {
        let (key, _) = self.var.key(name);
        let (f, ty) = self.fns.get(&key)?;
        if f.params().len() != args.len() {
            return Err(error!(SyntaxError));
        }
        self.fns.enter(self.config.function_depth)?;
        let mut saved = Vec::with_capacity(args.len());
        let mut bound = Ok(());
        for (param, arg) in f.params().iter().zip(args) {
            saved.push((param.clone(), self.var.fetch(param)));
            if self.var.type_of(param).is_string() != arg.is_string() {
                bound = Err(error!(TypeMismatch));
                break;
            }
            bound = self.var.store(param, arg);
            if bound.is_err() {
                break;
            }
        }
        let result = bound.and_then(|_| expr::expression(&mut f.body(), self));
        let mut restored = Ok(());
        for (param, old) in saved.into_iter().rev() {
            restored = restored.and(self.var.store(&param, old));
        }
        self.fns.leave();
        let val = result?;
        restored?;
        val.coerce(ty)
    }

    fn system(&mut self, code: Code, args: Vec<Val>) -> Result<Val> {
        let arg = |i: usize| -> Result<f64> {
            match args.get(i) {
                Some(val) => f64::try_from(val.clone()),
                None => Err(error!(MissingOperand)),
            }
        };
        match code {
            Code::Byte(tok::ERR) => Ok(Val::Integer(self.err as i16)),
            Code::Byte(tok::ERL) => Ok(match i16::try_from(self.erl) {
                Ok(n) => Val::Integer(n),
                Err(_) => Val::Single(self.erl as f32),
            }),
            Code::Byte(tok::CSRLIN) => Ok(Val::Integer(self.row as i16 + 1)),
            Code::Byte(tok::INKEY) => Ok(Val::String(self.host.inkey())),
            Code::Byte(tok::POINT) => {
                if args.len() == 1 {
                    return match arg(0)? as i32 {
                        0 => Ok(Val::Integer(self.pen.x as i16)),
                        1 => Ok(Val::Integer(self.pen.y as i16)),
                        _ => Err(error!(IllegalFunctionCall)),
                    };
                }
                let (x, y) = (arg(0)?.round() as i32, arg(1)?.round() as i32);
                let buf = self
                    .host
                    .graphics_buffer()
                    .ok_or_else(|| error!(IllegalFunctionCall))?;
                Ok(Val::Integer(buf.point(x, y).map_or(-1, i16::from)))
            }
            Code::Prefixed(PREFIX_XSTMT, xstmt::DATE) => {
                let now = chrono::Local::now();
                Ok(Val::from(now.format("%m-%d-%Y").to_string().as_str()))
            }
            Code::Prefixed(PREFIX_XSTMT, xstmt::TIME) => {
                let now = chrono::Local::now();
                Ok(Val::from(now.format("%H:%M:%S").to_string().as_str()))
            }
            Code::Prefixed(PREFIX_XSTMT, xstmt::TIMER) => {
                let now = chrono::Local::now();
                let secs = now.num_seconds_from_midnight() as f64
                    + (now.nanosecond() % 1_000_000_000) as f64 / 1e9;
                Ok(Val::Single(secs as f32))
            }
            Code::Prefixed(PREFIX_FN, func::RND) => {
                let n = if args.is_empty() { None } else { Some(arg(0)?) };
                Ok(Val::Single(self.random.rnd(n, Runtime::clock())))
            }
            Code::Prefixed(PREFIX_FN, func::FRE) => {
                let collect = matches!(args.first(), Some(Val::String(_)));
                Ok(Val::Single(self.var.free(collect) as f32))
            }
            Code::Prefixed(PREFIX_FN, func::POS) => Ok(Val::Integer(self.col as i16 + 1)),
            Code::Prefixed(PREFIX_FN, func::LPOS) => Ok(Val::Integer(1)),
            Code::Prefixed(PREFIX_FN, func::PEEK) => {
                Ok(Val::Integer(self.memory.peek(arg(0)?)? as i16))
            }
            Code::Prefixed(PREFIX_FN, func::INP)
            | Code::Prefixed(PREFIX_FN, func::PEN)
            | Code::Prefixed(PREFIX_FN, func::STICK)
            | Code::Prefixed(PREFIX_FN, func::STRIG) => {
                arg(0)?;
                Ok(Val::Integer(0))
            }
            Code::Prefixed(PREFIX_FN, func::EOF) => {
                Ok(Val::from(self.files.get(arg(0)?)?.eof()?))
            }
            Code::Prefixed(PREFIX_FN, func::LOC) => {
                Ok(Val::Single(self.files.get(arg(0)?)?.loc()? as f32))
            }
            Code::Prefixed(PREFIX_FN, func::LOF) => {
                Ok(Val::Single(self.files.get(arg(0)?)?.lof()? as f32))
            }
            Code::Prefixed(PREFIX_XFN, xfunc::INPUT) => {
                let n = arg(0)?.round();
                if n < 1.0 || n > 255.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                if args.len() > 1 {
                    return Ok(Val::String(self.files.get(arg(1)?)?.read_bytes(n as usize)?));
                }
                self.keystrokes(n as usize).map(Val::String)
            }
            Code::Prefixed(PREFIX_XFN, xfunc::EXTERR) => {
                arg(0)?;
                Ok(Val::Integer(0))
            }
            _ => Err(error!(SyntaxError)),
        }
    }

    fn varptr(&mut self, name: &[u8]) -> Result<Val> {
        Ok(Val::Integer(self.var.varptr(name)?))
    }
}

impl Runtime {
    /// INPUT$ from the keyboard: pending keystrokes first, then whole
    /// lines until enough characters have arrived.
    fn keystrokes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![];
        while out.len() < n {
            let key = self.host.inkey();
            if key.is_empty() {
                break;
            }
            out.extend(key);
        }
        while out.len() < n {
            match self.host.input("") {
                Some(line) => out.extend(cp437::to_bytes(&line)),
                None => break,
            }
        }
        out.truncate(n);
        Ok(out)
    }
}

/// True when the statement at `pos` runs inside the THEN or ELSE branch
/// of an IF earlier on the line. Such errors belong to the whole line:
/// RESUME starts it again and RESUME NEXT goes on to the next line.
fn in_branch(mut c: Cursor, pos: usize) -> bool {
    loop {
        while c.eat(b':') {}
        if c.pos() >= pos {
            return false;
        }
        match c.peek() {
            tok::IF => return true,
            EOL => return false,
            tok::ELSE => c.advance(1),
            _ => c.skip_statement(),
        }
    }
}
