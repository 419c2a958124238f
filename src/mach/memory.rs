use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// First byte of a BSAVE image.
const BSAVE_MAGIC: u8 = 0xFD;

/// ## Simulated DOS memory
///
/// PEEK and POKE address `segment * 16 + offset` in a flat byte array.
#[derive(Debug)]
pub struct Memory {
    bytes: Vec<u8>,
    segment: u16,
}

impl Memory {
    pub fn new(size: usize) -> Memory {
        Memory {
            bytes: vec![0; size],
            segment: 0,
        }
    }

    /// DEF SEG; no argument resets to zero.
    pub fn def_seg(&mut self, segment: Option<f64>) -> Result<()> {
        let segment = segment.unwrap_or(0.0).round();
        if segment < 0.0 || segment > 65535.0 {
            return Err(error!(IllegalFunctionCall));
        }
        self.segment = segment as u16;
        Ok(())
    }

    fn address(&self, offset: f64) -> Result<usize> {
        let offset = offset.round();
        if offset < 0.0 || offset > 65535.0 {
            return Err(error!(IllegalFunctionCall));
        }
        let addr = self.segment as usize * 16 + offset as usize;
        if addr >= self.bytes.len() {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(addr)
    }

    pub fn peek(&self, offset: f64) -> Result<u8> {
        Ok(self.bytes[self.address(offset)?])
    }

    pub fn poke(&mut self, offset: f64, value: i16) -> Result<()> {
        if !(0..=255).contains(&value) {
            return Err(error!(IllegalFunctionCall));
        }
        let addr = self.address(offset)?;
        self.bytes[addr] = value as u8;
        Ok(())
    }

    /// BSAVE image: magic, segment, offset and length (LE words), bytes.
    pub fn bsave(&self, offset: f64, len: f64) -> Result<Vec<u8>> {
        let start = self.address(offset)?;
        let len = len.round();
        if len < 0.0 || len > 65535.0 || start + len as usize > self.bytes.len() {
            return Err(error!(IllegalFunctionCall));
        }
        let len = len as usize;
        let mut out = vec![BSAVE_MAGIC];
        out.extend_from_slice(&self.segment.to_le_bytes());
        out.extend_from_slice(&((start - self.segment as usize * 16) as u16).to_le_bytes());
        out.extend_from_slice(&(len as u16).to_le_bytes());
        out.extend_from_slice(&self.bytes[start..start + len]);
        Ok(out)
    }

    /// BLOAD to the saved location, or to `offset` in the current segment.
    pub fn bload(&mut self, image: &[u8], offset: Option<f64>) -> Result<()> {
        if image.len() < 7 || image[0] != BSAVE_MAGIC {
            return Err(error!(BadFileMode));
        }
        let segment = u16::from_le_bytes([image[1], image[2]]);
        let saved_offset = u16::from_le_bytes([image[3], image[4]]);
        let len = u16::from_le_bytes([image[5], image[6]]) as usize;
        let data = &image[7..];
        let len = len.min(data.len());
        let start = match offset {
            Some(offset) => self.address(offset)?,
            None => segment as usize * 16 + saved_offset as usize,
        };
        if start + len > self.bytes.len() {
            return Err(error!(IllegalFunctionCall));
        }
        self.bytes[start..start + len].copy_from_slice(&data[..len]);
        Ok(())
    }
}
