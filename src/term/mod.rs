use ansi_term::Style;
use clap::Parser;
use gwbasic::lang::Error;
use gwbasic::mach::{Config, Event, Host, PixelBuffer, Runtime};
use linefeed::{DefaultTerminal, Interface, ReadResult, Signal};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// GW-BASIC compatible interpreter.
#[derive(Parser, Debug)]
#[command(name = "gwbasic", version, about)]
struct Args {
    /// Program to load and run.
    file: Option<String>,

    /// String heap size in bytes.
    #[arg(long, default_value_t = 8192)]
    string_space: usize,

    /// Width of a PRINT comma zone.
    #[arg(long, default_value_t = 14)]
    zone: usize,

    /// Console width in columns.
    #[arg(long, default_value_t = 80)]
    width: usize,
}

pub fn main() {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    if let Err(error) = main_loop(args) {
        eprintln!("{}", error);
    }
}

fn main_loop(args: Args) -> std::io::Result<()> {
    let interface = Arc::new(Interface::new("GW-BASIC")?);
    interface.set_report_signal(Signal::Interrupt, true);
    let config = Config {
        string_space: args.string_space,
        print_zone: args.zone,
        width: args.width,
        ..Config::default()
    };
    let mut runtime = Runtime::with_config(Box::new(Terminal::new(interface.clone())), config);
    let stop = runtime.stop_handle();
    let int_moved = stop.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let mut quiet = false;
    match args.file {
        Some(file) => {
            runtime.enter(&format!("RUN \"{}\"", file));
        }
        None => {
            interface.write_fmt(format_args!("GW-BASIC {}\n", env!("CARGO_PKG_VERSION")))?;
        }
    }
    loop {
        match runtime.execute(5000) {
            Event::Running => continue,
            Event::Quit => break,
            Event::Stopped | Event::Errored(_) => {}
        }
        if !quiet {
            interface.write_fmt(format_args!("Ok\n"))?;
        }
        interface.set_prompt("")?;
        let line = loop {
            match interface.read_line()? {
                ReadResult::Input(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    break line;
                }
                ReadResult::Signal(Signal::Interrupt) => {
                    interface.set_buffer("")?;
                    interface.write_fmt(format_args!("\n"))?;
                }
                ReadResult::Signal(_) | ReadResult::Eof => return Ok(()),
            }
        };
        stop.store(false, Ordering::SeqCst);
        let accepted = runtime.enter(&line);
        if accepted {
            interface.add_history_unique(line.clone());
        }
        quiet = accepted && line.trim_start().starts_with(|c: char| c.is_ascii_digit());
    }
    Ok(())
}

/// The console host: text through linefeed and an off-screen
/// 640x200 pixel buffer for the graphics statements.
struct Terminal {
    interface: Arc<Interface<DefaultTerminal>>,
    screen: PixelBuffer,
    mode: i16,
}

impl Terminal {
    fn new(interface: Arc<Interface<DefaultTerminal>>) -> Terminal {
        Terminal {
            interface,
            screen: PixelBuffer::new(640, 200),
            mode: 0,
        }
    }
}

impl Host for Terminal {
    fn print(&mut self, text: &str) {
        if let Err(error) = self.interface.write_fmt(format_args!("{}", text)) {
            warn!(%error, "console write failed");
        }
    }

    fn input(&mut self, prompt: &str) -> Option<String> {
        if let Err(error) = self.interface.set_prompt(prompt) {
            warn!(%error, "prompt failed");
        }
        let result = self.interface.read_line();
        if let Err(error) = self.interface.set_prompt("") {
            warn!(%error, "prompt failed");
        }
        match result {
            Ok(ReadResult::Input(line)) => Some(line),
            Ok(ReadResult::Signal(_)) | Ok(ReadResult::Eof) => {
                self.interface.set_buffer("").ok();
                None
            }
            Err(error) => {
                warn!(%error, "console read failed");
                None
            }
        }
    }

    fn screen_mode(&mut self, mode: i16) -> bool {
        if !(0..=2).contains(&mode) {
            return false;
        }
        if mode != self.mode {
            self.screen.clear(0);
            self.mode = mode;
        }
        true
    }

    fn graphics_buffer(&mut self) -> Option<&mut PixelBuffer> {
        Some(&mut self.screen)
    }

    fn sound(&mut self, freq: f64, ms: f64) {
        debug!(freq, ms, "sound");
    }

    fn error(&mut self, error: &Error) {
        let text = format!("{}\n", Style::new().bold().paint(error.to_string()));
        self.print(&text);
    }
}
