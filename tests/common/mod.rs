#![allow(dead_code)]

use gwbasic::mach::{Config, Event, Host, PixelBuffer, Runtime};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

/// What the capture host saw, shared with the test.
#[derive(Default)]
pub struct Captured {
    pub output: String,
    pub input: VecDeque<String>,
    pub keys: VecDeque<u8>,
    pub sounds: Vec<(f64, f64)>,
}

/// Host that records output and answers INPUT from a script. Replies
/// are echoed after the prompt the way a terminal would show them.
struct Capture {
    shared: Rc<RefCell<Captured>>,
    screen: Option<PixelBuffer>,
}

impl Host for Capture {
    fn print(&mut self, text: &str) {
        self.shared.borrow_mut().output.push_str(text);
    }

    fn input(&mut self, prompt: &str) -> Option<String> {
        let mut shared = self.shared.borrow_mut();
        shared.output.push_str(prompt);
        let line = shared.input.pop_front()?;
        shared.output.push_str(&line);
        shared.output.push('\n');
        Some(line)
    }

    fn screen_mode(&mut self, mode: i16) -> bool {
        mode == 0 || (matches!(mode, 1 | 2) && self.screen.is_some())
    }

    fn graphics_buffer(&mut self) -> Option<&mut PixelBuffer> {
        self.screen.as_mut()
    }

    fn inkey(&mut self) -> Vec<u8> {
        self.shared.borrow_mut().keys.pop_front().into_iter().collect()
    }

    fn sound(&mut self, freq: f64, ms: f64) {
        self.shared.borrow_mut().sounds.push((freq, ms));
    }
}

pub struct Basic {
    pub runtime: Runtime,
    shared: Rc<RefCell<Captured>>,
}

impl Basic {
    pub fn new() -> Basic {
        Basic::build(None, Config::default())
    }

    /// With a 320x200 screen for the graphics statements.
    pub fn with_graphics() -> Basic {
        Basic::build(Some(PixelBuffer::new(320, 200)), Config::default())
    }

    pub fn with_config(config: Config) -> Basic {
        Basic::build(None, config)
    }

    fn build(screen: Option<PixelBuffer>, config: Config) -> Basic {
        let shared = Rc::new(RefCell::new(Captured::default()));
        let host = Capture {
            shared: shared.clone(),
            screen,
        };
        Basic {
            runtime: Runtime::with_config(Box::new(host), config),
            shared,
        }
    }

    pub fn enter(&mut self, s: &str) -> bool {
        self.runtime.enter(s)
    }

    /// Enter every line of a program.
    pub fn program(&mut self, lines: &[&str]) {
        for line in lines {
            assert!(self.runtime.enter(line), "rejected: {}", line);
        }
    }

    /// Queue a reply for INPUT.
    pub fn reply(&mut self, line: &str) {
        self.shared.borrow_mut().input.push_back(line.to_string());
    }

    pub fn key(&mut self, key: u8) {
        self.shared.borrow_mut().keys.push_back(key);
    }

    pub fn sounds(&self) -> Vec<(f64, f64)> {
        self.shared.borrow().sounds.clone()
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.shared.borrow_mut().output)
    }
}

pub fn exec(b: &mut Basic) -> String {
    exec_n(b, 5000)
}

/// Run until the machine stops, then return what was printed.
pub fn exec_n(b: &mut Basic, cycles: usize) -> String {
    let mut rounds = 0;
    loop {
        match b.runtime.execute(cycles) {
            Event::Running => {
                rounds += 1;
                if rounds > 200 {
                    let mut s = b.take_output();
                    s.push_str("\nExecution cycles exceeded.\n");
                    return s;
                }
            }
            Event::Stopped | Event::Errored(_) | Event::Quit => break,
        }
    }
    b.take_output()
}

/// Enter a program, RUN it, and return the output.
pub fn run(lines: &[&str]) -> String {
    let mut b = Basic::new();
    b.program(lines);
    b.enter("RUN");
    exec(&mut b)
}

/// The last event of running to completion.
pub fn last_event(b: &mut Basic) -> Event {
    loop {
        match b.runtime.execute(5000) {
            Event::Running => continue,
            event => return event,
        }
    }
}

/// A file path in the temp directory unique to this process and test.
pub fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gwbasic-{}-{}", std::process::id(), name));
    path
}
