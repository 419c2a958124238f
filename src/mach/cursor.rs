use super::mbf::{Mbf32, Mbf64};
use super::Val;
use crate::error;
use crate::lang::token::{self, tok, DBL_LIT, EOL, INT_LIT, LINE_REF, SNG_LIT};
use crate::lang::Error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Token cursor
///
/// A read position in one crunched line. Statements and expressions
/// both walk the bytes in place; spaces between tokens are skipped.
#[derive(Debug, Clone)]
pub struct Cursor {
    bytes: Rc<[u8]>,
    pos: usize,
}

impl Cursor {
    pub fn new(bytes: Rc<[u8]>, pos: usize) -> Cursor {
        Cursor { bytes, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn bytes(&self) -> &Rc<[u8]> {
        &self.bytes
    }

    fn at(&self, pos: usize) -> u8 {
        self.bytes.get(pos).copied().unwrap_or(EOL)
    }

    pub fn skip_spaces(&mut self) {
        while self.at(self.pos) == b' ' {
            self.pos += 1;
        }
    }

    /// The next non-space byte, without consuming it.
    pub fn peek(&mut self) -> u8 {
        self.skip_spaces();
        self.at(self.pos)
    }

    /// The byte after the next one, for two-byte prefixed tokens.
    pub fn peek_second(&mut self) -> u8 {
        self.skip_spaces();
        self.at(self.pos + 1)
    }

    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.bytes.len());
    }

    /// Take one byte, spaces skipped.
    pub fn take(&mut self) -> u8 {
        let b = self.peek();
        if b != EOL {
            self.pos += 1;
        }
        b
    }

    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == b {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume a prefixed two-byte token.
    pub fn eat_prefixed(&mut self, prefix: u8, index: u8) -> bool {
        if self.peek() == prefix && self.at(self.pos + 1) == index {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, b: u8) -> Result<()> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(error!(SyntaxError))
        }
    }

    /// True where a statement ends.
    pub fn at_end(&mut self) -> bool {
        matches!(self.peek(), EOL | b':' | tok::ELSE | tok::APOSTROPHE)
    }

    /// An identifier as crunched: a letter, letters, digits and dots,
    /// then an optional type suffix.
    pub fn identifier(&mut self) -> Option<Vec<u8>> {
        let start = self.pos;
        if !self.peek().is_ascii_alphabetic() {
            return None;
        }
        let begin = self.pos;
        while self.at(self.pos).is_ascii_alphanumeric() || self.at(self.pos) == b'.' {
            self.pos += 1;
        }
        if matches!(self.at(self.pos), b'$' | b'%' | b'!' | b'#') {
            self.pos += 1;
        }
        if self.pos == begin {
            self.pos = start;
            return None;
        }
        Some(self.bytes[begin..self.pos].to_vec())
    }

    pub fn expect_identifier(&mut self) -> Result<Vec<u8>> {
        self.identifier().ok_or_else(|| error!(SyntaxError))
    }

    /// A bare word that the cruncher left as an identifier, like AS.
    pub fn word(&mut self, word: &str) -> bool {
        self.skip_spaces();
        let w = word.as_bytes();
        let end = self.pos + w.len();
        if end <= self.bytes.len()
            && &self.bytes[self.pos..end] == w
            && !(self.at(end).is_ascii_alphanumeric() || self.at(end) == b'.')
        {
            self.pos = end;
            true
        } else {
            false
        }
    }

    /// A line number operand; Integer literals are accepted as well.
    pub fn line_ref(&mut self) -> Option<u16> {
        match self.peek() {
            LINE_REF | INT_LIT => {
                let marker = self.at(self.pos);
                let n = u16::from_le_bytes([self.at(self.pos + 1), self.at(self.pos + 2)]);
                if marker == INT_LIT && (n as i16) < 0 {
                    return None;
                }
                self.pos += 3;
                Some(n)
            }
            _ => None,
        }
    }

    pub fn expect_line_ref(&mut self) -> Result<u16> {
        self.line_ref().ok_or_else(|| error!(SyntaxError))
    }

    /// A numeric literal at the cursor, if there is one.
    pub fn number(&mut self) -> Option<Val> {
        let p = self.pos;
        match self.peek() {
            INT_LIT => {
                let n = i16::from_le_bytes([self.at(self.pos + 1), self.at(self.pos + 2)]);
                self.pos += 3;
                Some(Val::Integer(n))
            }
            SNG_LIT => {
                let mut b = [0u8; 4];
                for (i, v) in b.iter_mut().enumerate() {
                    *v = self.at(self.pos + 1 + i);
                }
                self.pos += 5;
                Some(Val::Single(Mbf32::from_le_bytes(b).to_f32()))
            }
            DBL_LIT => {
                let mut b = [0u8; 8];
                for (i, v) in b.iter_mut().enumerate() {
                    *v = self.at(self.pos + 1 + i);
                }
                self.pos += 9;
                Some(Val::Double(Mbf64::from_le_bytes(b).to_f64()))
            }
            _ => {
                self.pos = p;
                None
            }
        }
    }

    /// A quoted literal; the closing quote may be missing at line end.
    pub fn string(&mut self) -> Option<Vec<u8>> {
        if self.peek() != b'"' {
            return None;
        }
        self.pos += 1;
        let start = self.pos;
        while !matches!(self.at(self.pos), b'"' | EOL) {
            self.pos += 1;
        }
        let s = self.bytes[start..self.pos].to_vec();
        if self.at(self.pos) == b'"' {
            self.pos += 1;
        }
        Some(s)
    }

    /// Step over one whole token, literal operands included.
    pub fn skip_token(&mut self) {
        self.pos = token::skip(&self.bytes, self.pos);
    }

    /// Move to the end of the current statement.
    pub fn skip_statement(&mut self) {
        loop {
            match self.at(self.pos) {
                EOL | b':' | tok::ELSE => return,
                _ => self.skip_token(),
            }
        }
    }

    /// Move to the line terminator.
    pub fn skip_line(&mut self) {
        self.pos = token::line_end(&self.bytes, self.pos);
    }

    /// Step over a balanced parenthesised group starting at `(`.
    pub fn skip_parens(&mut self) -> Result<()> {
        if self.peek() != b'(' {
            return Ok(());
        }
        let mut depth = 0;
        loop {
            match self.at(self.pos) {
                EOL => return Err(error!(SyntaxError)),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.skip_token();
        }
    }

    /// Raw bytes from here to the end of the statement.
    pub fn rest_of_statement(&mut self) -> Vec<u8> {
        let start = self.pos;
        self.skip_statement();
        self.bytes[start..self.pos].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::crunch;

    fn cursor(s: &str) -> Cursor {
        Cursor::new(crunch(s).unwrap().into(), 0)
    }

    #[test]
    fn test_identifier_and_word() {
        let mut c = cursor("OPEN \"F\" FOR OUTPUT AS #1");
        assert_eq!(c.take(), tok::OPEN);
        assert_eq!(c.string(), Some(b"F".to_vec()));
        assert_eq!(c.take(), tok::FOR);
        assert!(c.word("OUTPUT"));
        assert!(!c.word("A"));
        assert!(c.word("AS"));
        assert!(c.eat(b'#'));
        assert_eq!(c.number(), Some(Val::Integer(1)));
        assert!(c.at_end());
    }

    #[test]
    fn test_skip_statement_respects_strings() {
        let mut c = cursor("PRINT \"A:B\":X=1");
        c.skip_statement();
        assert_eq!(c.take(), b':');
        assert_eq!(c.identifier(), Some(b"X".to_vec()));
    }

    #[test]
    fn test_line_ref() {
        let mut c = cursor("GOTO 100");
        c.take();
        assert_eq!(c.line_ref(), Some(100));
        assert!(c.at_end());
    }

    #[test]
    fn test_skip_parens() {
        let mut c = cursor("A(I,\")\")=2");
        c.identifier();
        c.skip_parens().unwrap();
        assert_eq!(c.take(), tok::EQUAL);
    }
}
