use super::array::Arrays;
use super::heap::{Heap, StrDesc};
use super::Val;
use crate::error;
use crate::lang::{Error, Type};
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

/// Storage cell for one scalar or array element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    Integer(i16),
    Single(f32),
    Double(f64),
    String(StrDesc),
}

impl Slot {
    pub fn zero(ty: Type) -> Slot {
        match ty {
            Type::Integer => Slot::Integer(0),
            Type::Single => Slot::Single(0.0),
            Type::Double => Slot::Double(0.0),
            Type::String => Slot::String(StrDesc::default()),
        }
    }
}

/// ## Variable memory
///
/// Scalars and arrays live in separate tables so `A` and `A(1)` may
/// coexist. Keys are the upper-case name plus the resolved type suffix,
/// so `A` and `A!` name the same slot while A defaults to Single.
#[derive(Debug)]
pub struct Var {
    index: HashMap<String, usize>,
    slots: Vec<Slot>,
    arrays: Arrays,
    heap: Heap,
    types: [Type; 26],
}

impl Var {
    pub fn new(string_space: usize) -> Var {
        Var {
            index: HashMap::new(),
            slots: vec![],
            arrays: Arrays::default(),
            heap: Heap::new(string_space),
            types: [Type::Single; 26],
        }
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.arrays.clear();
        self.heap.clear();
        self.types = [Type::Single; 26];
    }

    /// DEFINT and friends over an inclusive letter range.
    pub fn set_default_type(&mut self, from: u8, to: u8, ty: Type) -> Result<()> {
        let from = from.to_ascii_uppercase();
        let to = to.to_ascii_uppercase();
        if !from.is_ascii_uppercase() || !to.is_ascii_uppercase() || from > to {
            return Err(error!(SyntaxError));
        }
        for letter in from..=to {
            self.types[(letter - b'A') as usize] = ty;
        }
        Ok(())
    }

    /// Explicit suffix wins, otherwise the first letter's default.
    pub fn type_of(&self, name: &[u8]) -> Type {
        match name.last().and_then(|&c| Type::from_suffix(c as char)) {
            Some(ty) => ty,
            None => match name.first() {
                Some(&c) if c.is_ascii_alphabetic() => {
                    self.types[(c.to_ascii_uppercase() - b'A') as usize]
                }
                _ => Type::Single,
            },
        }
    }

    pub fn key(&self, name: &[u8]) -> (String, Type) {
        let ty = self.type_of(name);
        let stem = match name.last() {
            Some(&c) if Type::from_suffix(c as char).is_some() => &name[..name.len() - 1],
            _ => name,
        };
        let mut key = String::from_utf8_lossy(stem).to_ascii_uppercase();
        key.push(ty.suffix());
        (key, ty)
    }

    fn to_val(&self, slot: Slot) -> Val {
        match slot {
            Slot::Integer(n) => Val::Integer(n),
            Slot::Single(n) => Val::Single(n),
            Slot::Double(n) => Val::Double(n),
            Slot::String(d) => Val::String(self.heap.get(d).to_vec()),
        }
    }

    fn alloc(&mut self, s: &[u8]) -> Result<StrDesc> {
        Heap::check_len(s)?;
        if let Some(desc) = self.heap.alloc(s) {
            return Ok(desc);
        }
        self.collect();
        self.heap.alloc(s).ok_or_else(Heap::out_of_space)
    }

    /// Compact the string heap over every live descriptor.
    pub fn collect(&mut self) {
        let scalars = self.slots.iter_mut().filter_map(|s| match s {
            Slot::String(d) => Some(d),
            _ => None,
        });
        self.heap.compact(scalars.chain(self.arrays.strings_mut()));
    }

    /// Free string space, compacting first when asked as FRE("") does.
    pub fn free(&mut self, collect: bool) -> usize {
        if collect {
            self.collect();
        }
        self.heap.free()
    }

    fn make_slot(&mut self, ty: Type, val: Val) -> Result<Slot> {
        Ok(match val.coerce(ty)? {
            Val::Integer(n) => Slot::Integer(n),
            Val::Single(n) => Slot::Single(n),
            Val::Double(n) => Slot::Double(n),
            Val::String(s) => Slot::String(self.alloc(&s)?),
        })
    }

    pub fn fetch(&self, name: &[u8]) -> Val {
        let (key, ty) = self.key(name);
        match self.index.get(&key) {
            Some(&i) => self.to_val(self.slots[i]),
            None => Val::zero(ty),
        }
    }

    pub fn contains(&self, name: &[u8]) -> bool {
        self.index.contains_key(&self.key(name).0)
    }

    pub fn store(&mut self, name: &[u8], val: Val) -> Result<()> {
        let (key, ty) = self.key(name);
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                if self.slots.len() >= u16::max_value() as usize {
                    return Err(error!(OutOfMemory));
                }
                self.slots.push(Slot::zero(ty));
                self.index.insert(key, self.slots.len() - 1);
                self.slots.len() - 1
            }
        };
        // Release the old string before allocating so compaction can
        // reclaim it.
        self.slots[i] = Slot::zero(ty);
        let slot = self.make_slot(ty, val)?;
        self.slots[i] = slot;
        Ok(())
    }

    pub fn dimension(&mut self, name: &[u8], upper: &[i16]) -> Result<()> {
        let (key, ty) = self.key(name);
        self.arrays.create(&key, ty, upper)
    }

    pub fn erase(&mut self, name: &[u8]) -> Result<()> {
        let (key, _) = self.key(name);
        self.arrays.erase(&key).map(|_| ())
    }

    pub fn option_base(&mut self, base: i16) -> Result<()> {
        self.arrays.set_base(base)
    }

    pub fn fetch_element(&mut self, name: &[u8], subscripts: &[i16]) -> Result<Val> {
        let (key, ty) = self.key(name);
        let array = self.arrays.get_or_create(&key, ty, subscripts.len())?;
        let slot = array.slot(array.offset(subscripts)?);
        Ok(self.to_val(slot))
    }

    pub fn store_element(&mut self, name: &[u8], subscripts: &[i16], val: Val) -> Result<()> {
        let (key, ty) = self.key(name);
        let offset = {
            let array = self.arrays.get_or_create(&key, ty, subscripts.len())?;
            let offset = array.offset(subscripts)?;
            *array.slot_mut(offset) = Slot::zero(ty);
            offset
        };
        let slot = self.make_slot(ty, val)?;
        let array = self.arrays.get_or_create(&key, ty, subscripts.len())?;
        *array.slot_mut(offset) = slot;
        Ok(())
    }

    /// Elements of a numeric array as raw little-endian bytes, two per
    /// Integer, four per Single (MBF), eight per Double (MBF). Used by
    /// graphics GET and PUT.
    pub fn array_bytes(&self, name: &[u8]) -> Result<Vec<u8>> {
        let (key, _) = self.key(name);
        let array = self.arrays.get(&key).ok_or_else(|| error!(IllegalFunctionCall))?;
        let mut bytes = Vec::with_capacity(array.len() * 2);
        for slot in array.slots() {
            match *slot {
                Slot::Integer(n) => bytes.extend_from_slice(&n.to_le_bytes()),
                Slot::Single(n) => bytes.extend_from_slice(&super::Mbf32::from(n).to_le_bytes()),
                Slot::Double(n) => bytes.extend_from_slice(&super::Mbf64::from(n).to_le_bytes()),
                Slot::String(_) => return Err(error!(TypeMismatch)),
            }
        }
        Ok(bytes)
    }

    /// Inverse of `array_bytes`, auto-dimensioning a missing array.
    /// Fails with Illegal function call when the array is too small.
    pub fn set_array_bytes(&mut self, name: &[u8], bytes: &[u8]) -> Result<()> {
        let (key, ty) = self.key(name);
        let array = self.arrays.get_or_create(&key, ty, 1)?;
        let width = match ty {
            Type::Integer => 2,
            Type::Single => 4,
            Type::Double => 8,
            Type::String => return Err(error!(TypeMismatch)),
        };
        if bytes.len() > array.len() * width {
            return Err(error!(IllegalFunctionCall));
        }
        for (i, chunk) in bytes.chunks(width).enumerate() {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            *array.slot_mut(i) = match ty {
                Type::Integer => Slot::Integer(i16::from_le_bytes([buf[0], buf[1]])),
                Type::Single => {
                    Slot::Single(super::Mbf32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]).to_f32())
                }
                _ => Slot::Double(super::Mbf64::from_le_bytes(buf).to_f64()),
            };
        }
        Ok(())
    }

    /// A stable pseudo address for VARPTR.
    pub fn varptr(&self, name: &[u8]) -> Result<i16> {
        let (key, _) = self.key(name);
        match self.index.get(&key) {
            Some(&i) => Ok((0x1000 + i * 8) as u16 as i16),
            None => Err(error!(IllegalFunctionCall)),
        }
    }

    pub fn heap_capacity(&self) -> usize {
        self.heap.capacity()
    }
}
