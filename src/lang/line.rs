use super::token::{self, EOL, LINE_REF};
use super::{crunch, detokenize, Error, LineNumber};

/// A crunched source line: its number (None for immediate mode) and the
/// statement bytes after the number, always terminated with 0x00.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    number: LineNumber,
    bytes: Vec<u8>,
}

impl Line {
    pub fn new(s: &str) -> Result<Line, Error> {
        let bytes = crunch(s)?;
        if bytes.len() >= 3 && bytes[0] == LINE_REF {
            Ok(Line {
                number: Some(u16::from_le_bytes([bytes[1], bytes[2]])),
                bytes: bytes[3..].to_vec(),
            })
        } else {
            Ok(Line {
                number: None,
                bytes,
            })
        }
    }

    pub fn from_parts(number: LineNumber, mut bytes: Vec<u8>) -> Line {
        if bytes.last() != Some(&EOL) {
            bytes.push(EOL);
        }
        Line { number, bytes }
    }

    pub fn number(&self) -> LineNumber {
        self.number
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_direct(&self) -> bool {
        self.number.is_none()
    }

    /// A numbered line with nothing after the number deletes that line.
    pub fn is_empty(&self) -> bool {
        let end = token::line_end(&self.bytes, 0);
        self.bytes[..end].iter().all(|&b| b == b' ')
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = detokenize(&self.bytes);
        match self.number {
            Some(number) => write!(f, "{} {}", number, s),
            None => write!(f, "{}", s),
        }
    }
}
