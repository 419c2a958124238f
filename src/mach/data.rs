use super::Program;
use crate::error;
use crate::lang::token::{self, tok, EOL};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// One DATA item as written: quoted items keep their spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub bytes: Vec<u8>,
    pub quoted: bool,
    pub line: u16,
}

/// ## READ cursor
///
/// Walks DATA bodies in program order. The line is kept as a number so
/// the cursor stays meaningful if the program changes between runs.
#[derive(Debug, Default)]
pub struct DataManager {
    line: u32,
    pos: usize,
    in_body: bool,
}

impl DataManager {
    pub fn new() -> DataManager {
        DataManager::default()
    }

    pub fn restore(&mut self, line: Option<u16>) {
        self.line = line.unwrap_or(0) as u32;
        self.pos = 0;
        self.in_body = false;
    }

    pub fn read(&mut self, program: &Program) -> Result<Datum> {
        loop {
            if self.line > u16::max_value() as u32 {
                return Err(error!(OutOfData));
            }
            let number = match program.find_line(self.line as u16) {
                Some(number) => number,
                None => return Err(error!(OutOfData)),
            };
            if number as u32 != self.line {
                self.line = number as u32;
                self.pos = 0;
                self.in_body = false;
            }
            let bytes = match program.get(number) {
                Some(bytes) => bytes,
                None => return Err(error!(OutOfData)),
            };
            if self.in_body {
                return Ok(self.item(&bytes, number));
            }
            let mut pos = self.pos;
            while pos < bytes.len() && bytes[pos] != EOL {
                if bytes[pos] == tok::DATA {
                    break;
                }
                pos = token::skip(&bytes, pos);
            }
            if pos < bytes.len() && bytes[pos] == tok::DATA {
                self.pos = pos + 1;
                self.in_body = true;
            } else {
                self.line += 1;
                self.pos = 0;
            }
        }
    }

    fn item(&mut self, bytes: &[u8], line: u16) -> Datum {
        let at = |p: usize| bytes.get(p).copied().unwrap_or(EOL);
        let mut pos = self.pos;
        while at(pos) == b' ' {
            pos += 1;
        }
        let mut datum = Datum {
            bytes: vec![],
            quoted: false,
            line,
        };
        if at(pos) == b'"' {
            datum.quoted = true;
            pos += 1;
            while at(pos) != b'"' && at(pos) != EOL {
                datum.bytes.push(at(pos));
                pos += 1;
            }
            if at(pos) == b'"' {
                pos += 1;
            }
            while at(pos) != b',' && at(pos) != b':' && at(pos) != EOL {
                pos += 1;
            }
        } else {
            while at(pos) != b',' && at(pos) != b':' && at(pos) != EOL {
                datum.bytes.push(at(pos));
                pos += 1;
            }
            while datum.bytes.last() == Some(&b' ') {
                datum.bytes.pop();
            }
        }
        if at(pos) == b',' {
            self.pos = pos + 1;
        } else {
            self.pos = pos;
            self.in_body = false;
        }
        datum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Line;

    fn program(src: &[&str]) -> Program {
        let mut p = Program::new();
        for s in src {
            p.enter(Line::new(s).unwrap());
        }
        p
    }

    fn texts(data: &mut DataManager, p: &Program, n: usize) -> Vec<String> {
        (0..n)
            .map(|_| String::from_utf8(data.read(p).unwrap().bytes).unwrap())
            .collect()
    }

    #[test]
    fn test_read_across_lines() {
        let p = program(&[
            "10 DATA 1, \"TWO, 2\" ,3.5",
            "20 PRINT:DATA ABC ,",
            "30 DATA \"X\":END",
        ]);
        let mut data = DataManager::new();
        assert_eq!(
            texts(&mut data, &p, 6),
            vec!["1", "TWO, 2", "3.5", "ABC", "", "X"]
        );
        assert_eq!(data.read(&p).unwrap_err().code(), 4);
    }

    #[test]
    fn test_restore_to_line() {
        let p = program(&["10 DATA 1", "20 DATA 2", "30 DATA 3"]);
        let mut data = DataManager::new();
        data.restore(Some(15));
        assert_eq!(texts(&mut data, &p, 2), vec!["2", "3"]);
        data.restore(None);
        let first = data.read(&p).unwrap();
        assert_eq!(first.bytes, b"1".to_vec());
        assert_eq!(first.line, 10);
        assert!(!first.quoted);
    }
}
