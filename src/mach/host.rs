use super::PixelBuffer;
use crate::lang::Error;

/// ## Host callbacks
///
/// Everything the interpreter core needs from the outside world. Only
/// `print` is required. Callbacks returning `bool` report whether the
/// request was acceptable; `false` becomes Illegal function call.
/// Numeric arguments of -1 mean "leave unchanged".
pub trait Host {
    fn print(&mut self, text: &str);

    /// One line of keyboard input. None means the user broke out.
    fn input(&mut self, prompt: &str) -> Option<String> {
        self.print(prompt);
        None
    }

    fn screen_mode(&mut self, mode: i16) -> bool {
        mode == 0
    }

    fn color(&mut self, _fg: i16, _bg: i16) -> bool {
        true
    }

    fn width(&mut self, cols: i16) -> bool {
        matches!(cols, 40 | 80 | 132)
    }

    fn graphics_buffer(&mut self) -> Option<&mut PixelBuffer> {
        None
    }

    fn locate(&mut self, _row: i16, _col: i16, _cursor: i16, _start: i16, _stop: i16) -> bool {
        true
    }

    fn cls(&mut self) -> bool {
        true
    }

    /// Zero or one pending keystroke; never blocks.
    fn inkey(&mut self) -> Vec<u8> {
        vec![]
    }

    fn sound(&mut self, _freq: f64, _ms: f64) {}

    /// An error that halted the program.
    fn error(&mut self, error: &Error) {
        self.print(&format!("{}\n", error));
    }
}
