use crate::error;
use crate::lang::Error;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Input,
    Output,
    Append,
    Random,
}

impl Mode {
    /// The one-letter modes of `OPEN "O", #1, "F"`.
    pub fn from_letter(letter: u8) -> Result<Mode> {
        match letter.to_ascii_uppercase() {
            b'I' => Ok(Mode::Input),
            b'O' => Ok(Mode::Output),
            b'A' => Ok(Mode::Append),
            b'R' => Ok(Mode::Random),
            _ => Err(error!(BadFileMode)),
        }
    }
}

/// A FIELD definition: a byte range of the record buffer and the string
/// variable bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub offset: usize,
    pub width: usize,
    pub name: Vec<u8>,
}

/// ## An open file
///
/// Sequential input is read whole when opened. Output goes straight to
/// the file. RANDOM files keep one record buffer.
#[derive(Debug)]
pub struct Handle {
    mode: Mode,
    file: File,
    data: Vec<u8>,
    pos: usize,
    col: usize,
    record_len: usize,
    buffer: Vec<u8>,
    fields: Vec<FieldDef>,
    record: u32,
}

impl Handle {
    fn expect_mode(&self, modes: &[Mode]) -> Result<()> {
        if modes.contains(&self.mode) {
            Ok(())
        } else {
            Err(error!(BadFileMode))
        }
    }

    /// Column of the print head for PRINT # zones.
    pub fn col(&self) -> usize {
        self.col
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.expect_mode(&[Mode::Output, Mode::Append])?;
        self.file.write_all(bytes)?;
        for &b in bytes {
            match b {
                b'\n' | b'\r' => self.col = 0,
                _ => self.col += 1,
            }
        }
        Ok(())
    }

    fn byte(&self) -> Option<u8> {
        match self.data.get(self.pos) {
            Some(0x1A) | None => None,
            Some(&b) => Some(b),
        }
    }

    pub fn eof(&self) -> Result<bool> {
        match self.mode {
            Mode::Input => Ok(self.byte().is_none()),
            Mode::Random => Ok((self.record as u64) * (self.record_len as u64) >= self.lof()?),
            _ => Err(error!(BadFileMode)),
        }
    }

    /// One INPUT # field: a quoted string, or text up to a comma or
    /// line end. Leading blanks and line breaks are skipped.
    pub fn read_field(&mut self) -> Result<(Vec<u8>, bool)> {
        self.expect_mode(&[Mode::Input])?;
        while let Some(b' ') | Some(b'\r') | Some(b'\n') = self.byte() {
            self.pos += 1;
        }
        if self.byte().is_none() {
            return Err(error!(InputPastEnd));
        }
        let mut field = vec![];
        let quoted = self.byte() == Some(b'"');
        if quoted {
            self.pos += 1;
            while let Some(b) = self.byte() {
                self.pos += 1;
                if b == b'"' {
                    break;
                }
                field.push(b);
            }
            while let Some(b' ') = self.byte() {
                self.pos += 1;
            }
        } else {
            while let Some(b) = self.byte() {
                if matches!(b, b',' | b'\r' | b'\n') {
                    break;
                }
                field.push(b);
                self.pos += 1;
            }
            while field.last() == Some(&b' ') {
                field.pop();
            }
        }
        match self.byte() {
            Some(b',') => self.pos += 1,
            Some(b'\r') => {
                self.pos += 1;
                if self.byte() == Some(b'\n') {
                    self.pos += 1;
                }
            }
            Some(b'\n') => self.pos += 1,
            _ => {}
        }
        Ok((field, quoted))
    }

    /// LINE INPUT #: everything up to the line break.
    pub fn read_line(&mut self) -> Result<Vec<u8>> {
        self.expect_mode(&[Mode::Input])?;
        if self.byte().is_none() {
            return Err(error!(InputPastEnd));
        }
        let mut line = vec![];
        while let Some(b) = self.byte() {
            self.pos += 1;
            match b {
                b'\n' => break,
                b'\r' => {
                    if self.byte() == Some(b'\n') {
                        self.pos += 1;
                    }
                    break;
                }
                _ => line.push(b),
            }
        }
        Ok(line)
    }

    /// INPUT$(n, #f).
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.expect_mode(&[Mode::Input])?;
        if self.pos + n > self.data.len() {
            return Err(error!(InputPastEnd));
        }
        let bytes = self.data[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(bytes)
    }

    pub fn lof(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Last record read or written, or sequential 128-byte blocks used.
    pub fn loc(&self) -> Result<u64> {
        match self.mode {
            Mode::Random => Ok(self.record as u64),
            Mode::Input => Ok((self.pos as u64 + 127) / 128),
            _ => Ok((self.lof()? + 127) / 128),
        }
    }

    /// FIELD #n, w AS v$, ... lays its views out from the start of the
    /// record. Views from earlier FIELD statements stay over the same
    /// bytes; a variable named again moves to its new view.
    pub fn field(&mut self, defs: Vec<(usize, Vec<u8>)>) -> Result<Vec<FieldDef>> {
        self.expect_mode(&[Mode::Random])?;
        let total: usize = defs.iter().map(|(w, _)| w).sum();
        if total > self.record_len {
            return Err(error!(FieldOverflow));
        }
        self.fields
            .retain(|f| !defs.iter().any(|(_, name)| *name == f.name));
        let mut offset = 0;
        let added: Vec<FieldDef> = defs
            .into_iter()
            .map(|(width, name)| {
                let def = FieldDef {
                    offset,
                    width,
                    name,
                };
                offset += width;
                def
            })
            .collect();
        self.fields.extend(added.iter().cloned());
        Ok(added)
    }

    /// Views sharing at least one byte with `def`, itself included.
    fn overlapping(&self, def: &FieldDef) -> Vec<FieldDef> {
        self.fields
            .iter()
            .filter(|f| f.offset < def.offset + def.width && def.offset < f.offset + f.width)
            .cloned()
            .collect()
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_bytes(&self, def: &FieldDef) -> Vec<u8> {
        self.buffer[def.offset..def.offset + def.width].to_vec()
    }

    /// Copy a value into its field, space-padded or cut to the width.
    pub fn set_field_bytes(&mut self, def: &FieldDef, bytes: &[u8]) {
        for i in 0..def.width {
            self.buffer[def.offset + i] = bytes.get(i).copied().unwrap_or(b' ');
        }
    }

    fn seek_record(&mut self, record: Option<f64>) -> Result<()> {
        self.expect_mode(&[Mode::Random])?;
        let record = match record {
            Some(r) => {
                if r < 1.0 || r > 16_777_215.0 {
                    return Err(error!(BadRecordNumber));
                }
                r as u32
            }
            None => self.record + 1,
        };
        self.record = record;
        let offset = (record as u64 - 1) * self.record_len as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// GET #n: fill the record buffer. Reading past the end gives zeros.
    pub fn get(&mut self, record: Option<f64>) -> Result<()> {
        self.seek_record(record)?;
        for b in self.buffer.iter_mut() {
            *b = 0;
        }
        let mut read = 0;
        while read < self.record_len {
            let n = self.file.read(&mut self.buffer[read..])?;
            if n == 0 {
                break;
            }
            read += n;
        }
        Ok(())
    }

    pub fn put(&mut self, record: Option<f64>) -> Result<()> {
        self.seek_record(record)?;
        self.file.write_all(&self.buffer)?;
        Ok(())
    }
}

/// ## File numbers
///
/// Numbers run from 1 to the configured maximum.
#[derive(Debug)]
pub struct Files {
    handles: BTreeMap<u16, Handle>,
    max: u16,
}

impl Files {
    pub fn new(max: u16) -> Files {
        Files {
            handles: BTreeMap::new(),
            max,
        }
    }

    fn check_number(&self, number: f64) -> Result<u16> {
        let n = number.round();
        if n < 1.0 || n > self.max as f64 {
            return Err(error!(BadFileNumber));
        }
        Ok(n as u16)
    }

    pub fn open(&mut self, number: f64, name: &str, mode: Mode, record_len: usize) -> Result<()> {
        let number = self.check_number(number)?;
        if self.handles.contains_key(&number) {
            return Err(error!(BadFileNumber));
        }
        if name.is_empty() {
            return Err(error!(BadFileName));
        }
        if record_len == 0 || record_len > 32767 {
            return Err(error!(IllegalFunctionCall));
        }
        let (file, data) = match mode {
            Mode::Input => {
                let mut file = File::open(name)?;
                let mut data = vec![];
                file.read_to_end(&mut data)?;
                (file, data)
            }
            Mode::Output => (File::create(name)?, vec![]),
            Mode::Append => (
                OpenOptions::new().append(true).create(true).open(name)?,
                vec![],
            ),
            Mode::Random => (
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(name)?,
                vec![],
            ),
        };
        debug!(number, name, ?mode, "open");
        self.handles.insert(
            number,
            Handle {
                mode,
                file,
                data,
                pos: 0,
                col: 0,
                record_len,
                buffer: vec![0; record_len],
                fields: vec![],
                record: 0,
            },
        );
        Ok(())
    }

    pub fn get(&mut self, number: f64) -> Result<&mut Handle> {
        let number = self.check_number(number)?;
        self.handles
            .get_mut(&number)
            .ok_or_else(|| error!(BadFileNumber))
    }

    /// Closing a number that is not open is not an error.
    pub fn close(&mut self, number: f64) -> Result<()> {
        let number = self.check_number(number)?;
        if let Some(mut handle) = self.handles.remove(&number) {
            handle.file.flush()?;
            debug!(number, "close");
        }
        Ok(())
    }

    /// Width of the FIELD `name` is bound to in any open file.
    pub fn field_width(&self, name: &[u8]) -> Option<usize> {
        self.handles
            .values()
            .flat_map(|h| h.fields.iter())
            .find(|f| f.name == name)
            .map(|f| f.width)
    }

    /// LSET/RSET of a field variable: write `bytes` into every view bound
    /// to `name`, then return the new contents of each variable whose view
    /// overlaps the bytes written.
    pub fn set_field(&mut self, name: &[u8], bytes: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut changed = vec![];
        for handle in self.handles.values_mut() {
            let bound: Vec<FieldDef> = handle
                .fields
                .iter()
                .filter(|f| f.name == name)
                .cloned()
                .collect();
            for def in bound {
                handle.set_field_bytes(&def, bytes);
                for view in handle.overlapping(&def) {
                    let contents = handle.field_bytes(&view);
                    changed.push((view.name, contents));
                }
            }
        }
        changed
    }

    pub fn close_all(&mut self) {
        for (number, mut handle) in std::mem::take(&mut self.handles) {
            if handle.file.flush().is_ok() {
                debug!(number, "close");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(name: &str) -> String {
        let mut path = std::env::temp_dir();
        path.push(format!("gwbasic-file-{}-{}", std::process::id(), name));
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_sequential_round_trip() {
        let path = temp("seq");
        let mut files = Files::new(3);
        files.open(1.0, &path, Mode::Output, 128).unwrap();
        files.get(1.0).unwrap().write(b"\"A,B\",12\r\nLINE 2\r\n").unwrap();
        assert_eq!(files.get(1.0).unwrap().read_field().unwrap_err().code(), 54);
        files.close(1.0).unwrap();
        files.open(1.0, &path, Mode::Input, 128).unwrap();
        let f = files.get(1.0).unwrap();
        assert_eq!(f.read_field().unwrap(), (b"A,B".to_vec(), true));
        assert_eq!(f.read_field().unwrap(), (b"12".to_vec(), false));
        assert_eq!(f.read_line().unwrap(), b"LINE 2".to_vec());
        assert!(f.eof().unwrap());
        assert_eq!(f.read_line().unwrap_err().code(), 62);
        files.close_all();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_numbers() {
        let path = temp("numbers");
        let mut files = Files::new(3);
        assert_eq!(files.open(4.0, &path, Mode::Output, 128).unwrap_err().code(), 52);
        files.open(2.0, &path, Mode::Output, 128).unwrap();
        assert_eq!(files.open(2.0, &path, Mode::Output, 128).unwrap_err().code(), 52);
        assert_eq!(files.get(1.0).unwrap_err().code(), 52);
        files.close(2.0).unwrap();
        files.close(2.0).unwrap();
        assert_eq!(
            files.open(1.0, &temp("missing"), Mode::Input, 128).unwrap_err().code(),
            53
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_random_records() {
        let path = temp("random");
        std::fs::remove_file(&path).ok();
        let mut files = Files::new(3);
        files.open(1.0, &path, Mode::Random, 8).unwrap();
        let f = files.get(1.0).unwrap();
        assert_eq!(f.field(vec![(6, b"A$".to_vec()), (3, b"B$".to_vec())]).unwrap_err().code(), 50);
        f.field(vec![(5, b"A$".to_vec()), (3, b"B$".to_vec())]).unwrap();
        let defs = f.fields().to_vec();
        f.set_field_bytes(&defs[0], b"HI");
        f.set_field_bytes(&defs[1], b"XYZW");
        f.put(Some(2.0)).unwrap();
        assert_eq!(f.lof().unwrap(), 16);
        f.get(Some(1.0)).unwrap();
        assert_eq!(f.field_bytes(&defs[0]), vec![0; 5]);
        f.get(Some(2.0)).unwrap();
        assert_eq!(f.field_bytes(&defs[0]), b"HI   ".to_vec());
        assert_eq!(f.field_bytes(&defs[1]), b"XYZ".to_vec());
        assert_eq!(f.loc().unwrap(), 2);
        assert_eq!(f.get(Some(0.0)).unwrap_err().code(), 63);
        files.close_all();
        std::fs::remove_file(&path).ok();
    }
}
