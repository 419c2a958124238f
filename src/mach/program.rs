use crate::error;
use crate::lang::token::{self, LINE_REF};
use crate::lang::{Error, Line, LineNumber, MaxValue};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::ops::RangeInclusive;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Program memory
///
/// Crunched lines keyed by line number. Bytes are shared so a running
/// line survives an edit of the store.
#[derive(Debug, Default, Clone)]
pub struct Program {
    lines: BTreeMap<u16, Rc<[u8]>>,
}

impl Program {
    pub fn new() -> Program {
        Program::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Insert or replace a line. An empty line deletes instead.
    pub fn enter(&mut self, line: Line) {
        let number = match line.number() {
            Some(number) => number,
            None => return,
        };
        if line.is_empty() {
            self.lines.remove(&number);
        } else {
            self.insert(number, line.into_bytes());
        }
    }

    pub fn insert(&mut self, number: u16, bytes: Vec<u8>) {
        let mut bytes = bytes;
        if bytes.last() != Some(&token::EOL) {
            bytes.push(token::EOL);
        }
        self.lines.insert(number, bytes.into());
    }

    pub fn remove(&mut self, number: u16) -> bool {
        self.lines.remove(&number).is_some()
    }

    pub fn contains(&self, number: u16) -> bool {
        self.lines.contains_key(&number)
    }

    pub fn get(&self, number: u16) -> Option<Rc<[u8]>> {
        self.lines.get(&number).cloned()
    }

    pub fn first(&self) -> Option<u16> {
        self.lines.keys().next().copied()
    }

    /// First line numbered `number` or higher.
    pub fn find_line(&self, number: u16) -> Option<u16> {
        self.lines.range(number..).next().map(|(n, _)| *n)
    }

    /// First line numbered strictly above `number`.
    pub fn next_line(&self, number: u16) -> Option<u16> {
        if number == u16::max_value() {
            return None;
        }
        self.find_line(number + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Rc<[u8]>)> {
        self.lines.iter().map(|(n, b)| (*n, b))
    }

    pub fn numbers(&self) -> Vec<u16> {
        self.lines.keys().copied().collect()
    }

    /// Listing text for lines in `range`, one string per line.
    pub fn list(&self, range: RangeInclusive<u16>) -> Vec<String> {
        self.lines
            .range(range)
            .map(|(n, b)| Line::from_parts(Some(*n), b.to_vec()).to_string())
            .collect()
    }

    /// DELETE removes a range. A single line that does not exist is an
    /// error; so is a range with nothing in it.
    pub fn delete(&mut self, range: RangeInclusive<u16>) -> Result<()> {
        let doomed: Vec<u16> = self.lines.range(range.clone()).map(|(n, _)| *n).collect();
        if doomed.is_empty() || (range.start() == range.end() && !self.contains(*range.start())) {
            return Err(error!(IllegalFunctionCall));
        }
        for n in doomed {
            self.lines.remove(&n);
        }
        Ok(())
    }

    /// The saved form: for each line `link(2) number(2) tokens 0x00`,
    /// where link is the offset of the next record and 0 on the last.
    /// A link past 64 KiB cannot be written and fails with Out of memory.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = vec![];
        let count = self.lines.len();
        for (i, (number, bytes)) in self.lines.iter().enumerate() {
            let next = out.len() + 4 + bytes.len();
            let link = if i + 1 == count {
                0
            } else {
                u16::try_from(next).map_err(|_| error!(OutOfMemory))?
            };
            out.extend_from_slice(&link.to_le_bytes());
            out.extend_from_slice(&number.to_le_bytes());
            out.extend_from_slice(bytes);
        }
        Ok(out)
    }

    /// Rebuild a program from `serialize` output. Link chains that do not
    /// match the records, and line numbers out of order, are rejected.
    pub fn deserialize(bytes: &[u8]) -> Result<Program> {
        let bad = || error!(BadFileMode; "MALFORMED PROGRAM");
        let mut program = Program::new();
        let mut pos = 0usize;
        let mut last: Option<u16> = None;
        while pos < bytes.len() {
            if pos + 4 > bytes.len() {
                return Err(bad());
            }
            let link = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]) as usize;
            let number = u16::from_le_bytes([bytes[pos + 2], bytes[pos + 3]]);
            if number > LineNumber::max_value() || last.map_or(false, |l| number <= l) {
                return Err(bad());
            }
            let start = pos + 4;
            let end = token::line_end(bytes, start);
            if end >= bytes.len() {
                return Err(bad());
            }
            let next = end + 1;
            if link == 0 {
                if next != bytes.len() {
                    return Err(bad());
                }
            } else if link != next {
                return Err(bad());
            }
            program.insert(number, bytes[start..next].to_vec());
            last = Some(number);
            pos = next;
        }
        Ok(program)
    }

    /// RENUM: lines from `old` onwards are renumbered from `new` in steps
    /// of `step`, and every line reference is rewritten. References to
    /// lines that do not exist are reported back and left alone.
    pub fn renumber(&mut self, new: u16, old: u16, step: u16) -> Result<Vec<String>> {
        if step == 0 {
            return Err(error!(IllegalFunctionCall));
        }
        let moving: Vec<u16> = self.lines.range(old..).map(|(n, _)| *n).collect();
        if let Some(below) = self.lines.range(..old).next_back().map(|(n, _)| *n) {
            if new <= below {
                return Err(error!(IllegalFunctionCall));
            }
        }
        let mut map: BTreeMap<u16, u16> = BTreeMap::new();
        let mut number = new as u32;
        for &n in &moving {
            if number > LineNumber::max_value() as u32 {
                return Err(error!(IllegalFunctionCall));
            }
            map.insert(n, number as u16);
            number += step as u32;
        }
        let mut warnings = vec![];
        let mut lines = BTreeMap::new();
        for (&n, bytes) in self.lines.iter() {
            let mut bytes = bytes.to_vec();
            let mut pos = 0;
            while pos < bytes.len() && bytes[pos] != token::EOL {
                if bytes[pos] == LINE_REF && pos + 2 < bytes.len() {
                    let target = u16::from_le_bytes([bytes[pos + 1], bytes[pos + 2]]);
                    if let Some(&to) = map.get(&target) {
                        bytes[pos + 1..pos + 3].copy_from_slice(&to.to_le_bytes());
                    } else if !self.lines.contains_key(&target) && target != 0 {
                        warnings.push(format!("Undefined line {} in {}", target, n));
                    }
                }
                pos = token::skip(&bytes, pos);
            }
            let n = map.get(&n).copied().unwrap_or(n);
            lines.insert(n, bytes.into());
        }
        self.lines = lines;
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    fn program(src: &[&str]) -> Program {
        let mut p = Program::new();
        for s in src {
            p.enter(Line::new(s).unwrap());
        }
        p
    }

    #[test]
    fn test_lookup() {
        let p = program(&["30 END", "10 PRINT", "20 GOTO 10"]);
        assert_eq!(p.numbers(), vec![10, 20, 30]);
        assert_eq!(p.find_line(15), Some(20));
        assert_eq!(p.find_line(20), Some(20));
        assert_eq!(p.next_line(20), Some(30));
        assert_eq!(p.next_line(30), None);
    }

    #[test]
    fn test_replace_and_delete() {
        let mut p = program(&["10 PRINT 1", "10 PRINT 2", "20 END"]);
        assert_eq!(p.list(0..=65529), vec!["10 PRINT 2", "20 END"]);
        p.enter(Line::new("20").unwrap());
        assert_eq!(p.len(), 1);
        assert_eq!(p.delete(15..=15).unwrap_err().code(), 5);
    }

    #[test]
    fn test_serialize_links() {
        let p = program(&["10 A=1", "20 END"]);
        let bytes = p.serialize().unwrap();
        let first_len = 4 + p.get(10).unwrap().len();
        assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]) as usize, first_len);
        assert_eq!(&bytes[2..4], &[10, 0]);
        assert_eq!(&bytes[first_len..first_len + 2], &[0, 0]);
        let back = Program::deserialize(&bytes).unwrap();
        assert_eq!(back.list(0..=65529), p.list(0..=65529));
        let mut broken = bytes.clone();
        broken[0] = 99;
        assert!(Program::deserialize(&broken).is_err());
    }

    #[test]
    fn test_serialize_literal_zero_bytes() {
        let p = program(&["10 A=0:B=256", "20 PRINT A"]);
        let back = Program::deserialize(&p.serialize().unwrap()).unwrap();
        assert_eq!(back.list(0..=65529), vec!["10 A=0:B=256", "20 PRINT A"]);
    }

    #[test]
    fn test_serialize_past_link_range() {
        let mut p = Program::new();
        let body = format!("REM {}", "X".repeat(240));
        for n in 1..=300 {
            p.insert(n, crate::lang::crunch(&body).unwrap());
        }
        assert_eq!(p.serialize().unwrap_err().code(), 7);
        let mut p = Program::new();
        for n in 1..=200 {
            p.insert(n, crate::lang::crunch(&body).unwrap());
        }
        assert!(p.serialize().is_ok());
    }

    #[test]
    fn test_renumber() {
        let mut p = program(&["5 GOTO 7", "7 GOSUB 9", "9 RETURN"]);
        let warnings = p.renumber(100, 0, 10).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(
            p.list(0..=65529),
            vec!["100 GOTO 110", "110 GOSUB 120", "120 RETURN"]
        );
        let mut p = program(&["10 GOTO 99"]);
        assert_eq!(p.renumber(10, 0, 10).unwrap(), vec!["Undefined line 99 in 10"]);
    }

    quickcheck! {
        fn prop_lines_stay_ordered(numbers: Vec<u16>) -> bool {
            let mut p = Program::new();
            for n in numbers {
                let n = n % 65530;
                if let Ok(line) = Line::new(&format!("{} END", n)) {
                    p.enter(line);
                }
            }
            p.numbers().windows(2).all(|w| w[0] < w[1])
        }
    }
}
