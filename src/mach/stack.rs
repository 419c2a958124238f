use super::event::Trap;
use super::Val;
use crate::error;
use crate::lang::{Error, LineNumber};

type Result<T> = std::result::Result<T, Error>;

/// A statement position: the line (None for the direct line) and the
/// byte offset where the statement begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPos {
    pub line: LineNumber,
    pub pos: usize,
}

impl TextPos {
    pub fn new(line: LineNumber, pos: usize) -> TextPos {
        TextPos { line, pos }
    }

    pub fn start_of(line: u16) -> TextPos {
        TextPos {
            line: Some(line),
            pos: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForFrame {
    pub var: Vec<u8>,
    pub key: String,
    pub limit: Val,
    pub step: Val,
    pub body: TextPos,
}

#[derive(Debug, Clone)]
pub struct GosubFrame {
    pub ret: TextPos,
    pub trap: Option<Trap>,
    pub for_depth: usize,
    pub while_depth: usize,
}

#[derive(Debug, Clone)]
pub struct WhileFrame {
    pub start: TextPos,
}

/// Pushed when an error is trapped, popped by RESUME.
#[derive(Debug, Clone)]
pub struct ErrorFrame {
    pub error: Error,
    pub at: TextPos,
    pub next: TextPos,
}

/// ## Stack enforced and size limited vector

pub struct Stack<T> {
    overflow_message: &'static str,
    limit: usize,
    vec: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.vec)
    }
}

impl<T> Stack<T> {
    pub fn new(overflow_message: &'static str) -> Stack<T> {
        Stack {
            overflow_message,
            limit: u16::max_value() as usize,
            vec: vec![],
        }
    }
    pub fn with_limit(mut self, limit: usize) -> Stack<T> {
        self.limit = limit;
        self
    }
    fn overflow_check(&self) -> Result<()> {
        if self.vec.len() > self.limit {
            Err(error!(OutOfMemory; self.overflow_message))
        } else {
            Ok(())
        }
    }
    pub fn clear(&mut self) {
        self.vec.clear()
    }
    pub fn truncate(&mut self, len: usize) {
        self.vec.truncate(len)
    }
    pub fn len(&self) -> usize {
        self.vec.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
    pub fn last(&self) -> Option<&T> {
        self.vec.last()
    }
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.vec.last_mut()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.vec.iter()
    }
    pub fn push(&mut self, val: T) -> Result<()> {
        self.vec.push(val);
        let result = self.overflow_check();
        if result.is_err() {
            self.vec.pop();
        }
        result
    }
    pub fn pop(&mut self) -> Option<T> {
        self.vec.pop()
    }
    /// Index of the newest entry matching `f`.
    pub fn rposition<F: Fn(&T) -> bool>(&self, f: F) -> Option<usize> {
        self.vec.iter().rposition(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit() {
        let mut s: Stack<u8> = Stack::new("STACK OVERFLOW").with_limit(2);
        s.push(1).unwrap();
        s.push(2).unwrap();
        let e = s.push(3).unwrap_err();
        assert_eq!(e.code(), 7);
        assert_eq!(e.detail(), "STACK OVERFLOW");
        assert_eq!(s.len(), 2);
        assert_eq!(s.rposition(|&v| v == 1), Some(0));
    }
}
