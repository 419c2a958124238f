use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// A string as a variable slot holds it: a length and an offset into
/// the heap. Descriptors are plain data; the heap owns the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrDesc {
    pub len: u16,
    pub ptr: u32,
}

/// ## Bounded string space
///
/// Allocation bumps a top pointer. When the top reaches capacity the
/// owner compacts by sliding every live string down over the garbage.
#[derive(Debug)]
pub struct Heap {
    bytes: Vec<u8>,
    top: usize,
}

impl Heap {
    pub fn new(capacity: usize) -> Heap {
        Heap {
            bytes: vec![0; capacity],
            top: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn free(&self) -> usize {
        self.bytes.len() - self.top
    }

    pub fn clear(&mut self) {
        self.top = 0;
    }

    pub fn get(&self, desc: StrDesc) -> &[u8] {
        let start = desc.ptr as usize;
        &self.bytes[start..start + desc.len as usize]
    }

    /// Copy `s` into the heap, or None when there is no room left above
    /// the top pointer.
    pub fn alloc(&mut self, s: &[u8]) -> Option<StrDesc> {
        if s.is_empty() {
            return Some(StrDesc::default());
        }
        if s.len() > self.free() {
            return None;
        }
        let ptr = self.top;
        self.bytes[ptr..ptr + s.len()].copy_from_slice(s);
        self.top += s.len();
        Some(StrDesc {
            len: s.len() as u16,
            ptr: ptr as u32,
        })
    }

    /// Slide live strings to the bottom of the heap in address order and
    /// rewrite their descriptors. Every live descriptor must be passed.
    pub fn compact<'a, I>(&mut self, roots: I)
    where
        I: IntoIterator<Item = &'a mut StrDesc>,
    {
        let mut roots: Vec<&mut StrDesc> = roots.into_iter().filter(|d| d.len > 0).collect();
        roots.sort_by_key(|d| d.ptr);
        let mut top = 0usize;
        let mut last: Option<(u32, u32)> = None;
        for desc in roots {
            if let Some((old, new)) = last {
                if desc.ptr == old {
                    desc.ptr = new;
                    continue;
                }
            }
            let start = desc.ptr as usize;
            let len = desc.len as usize;
            self.bytes.copy_within(start..start + len, top);
            last = Some((desc.ptr, top as u32));
            desc.ptr = top as u32;
            top += len;
        }
        self.top = top;
    }

    pub fn out_of_space() -> Error {
        error!(OutOfStringSpace)
    }

    pub fn check_len(s: &[u8]) -> Result<()> {
        if s.len() > 255 {
            Err(error!(StringTooLong))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_until_full() {
        let mut heap = Heap::new(8);
        let a = heap.alloc(b"ABCD").unwrap();
        assert_eq!(heap.get(a), b"ABCD");
        assert!(heap.alloc(b"EFGHI").is_none());
        assert_eq!(heap.free(), 4);
        assert_eq!(heap.alloc(b""), Some(StrDesc::default()));
    }

    #[test]
    fn test_compact_keeps_live_strings() {
        let mut heap = Heap::new(12);
        let _dead = heap.alloc(b"XXXX").unwrap();
        let mut b = heap.alloc(b"BB").unwrap();
        let _dead2 = heap.alloc(b"YYY").unwrap();
        let mut c = heap.alloc(b"CCC").unwrap();
        assert_eq!(heap.free(), 0);
        heap.compact(vec![&mut c, &mut b]);
        assert_eq!(heap.get(b), b"BB");
        assert_eq!(heap.get(c), b"CCC");
        assert_eq!(heap.free(), 7);
    }
}
