use super::heap::StrDesc;
use super::var::Slot;
use crate::error;
use crate::lang::{Error, Type};
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

/// Arrays larger than this many elements are Out of memory.
const MAX_ELEMENTS: usize = 1 << 22;

/// ## Dimensioned arrays

#[derive(Debug)]
pub struct Array {
    bounds: Vec<(i16, i16)>,
    slots: Vec<Slot>,
}

impl Array {
    fn new(ty: Type, base: i16, upper: &[i16]) -> Result<Array> {
        let mut len = 1usize;
        let mut bounds = Vec::with_capacity(upper.len());
        for &ub in upper {
            if ub < base {
                return Err(error!(SubscriptOutOfRange));
            }
            len = len.saturating_mul((ub - base) as usize + 1);
            bounds.push((base, ub));
        }
        if len > MAX_ELEMENTS {
            return Err(error!(OutOfMemory));
        }
        Ok(Array {
            bounds,
            slots: vec![Slot::zero(ty); len],
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Row-major offset of an element, first subscript varying slowest.
    pub fn offset(&self, subscripts: &[i16]) -> Result<usize> {
        if subscripts.len() != self.bounds.len() {
            return Err(error!(SubscriptOutOfRange));
        }
        let mut offset = 0usize;
        for (&sub, &(lb, ub)) in subscripts.iter().zip(&self.bounds) {
            if sub < lb || sub > ub {
                return Err(error!(SubscriptOutOfRange));
            }
            offset = offset * (ub - lb + 1) as usize + (sub - lb) as usize;
        }
        Ok(offset)
    }

    pub fn slot(&self, offset: usize) -> Slot {
        self.slots[offset]
    }

    pub fn slot_mut(&mut self, offset: usize) -> &mut Slot {
        &mut self.slots[offset]
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

/// All arrays of a program, keyed like scalars, plus the OPTION BASE
/// lower bound used when creating new ones.
#[derive(Debug, Default)]
pub struct Arrays {
    map: HashMap<String, Array>,
    base: i16,
    base_set: bool,
}

impl Arrays {
    pub fn clear(&mut self) {
        self.map.clear();
        self.base = 0;
        self.base_set = false;
    }

    /// OPTION BASE may be given once, before any array exists.
    pub fn set_base(&mut self, base: i16) -> Result<()> {
        if base != 0 && base != 1 {
            return Err(error!(SyntaxError));
        }
        if !self.map.is_empty() || (self.base_set && self.base != base) {
            return Err(error!(DuplicateDefinition));
        }
        self.base = base;
        self.base_set = true;
        Ok(())
    }

    pub fn create(&mut self, key: &str, ty: Type, upper: &[i16]) -> Result<()> {
        if self.map.contains_key(key) {
            return Err(error!(DuplicateDefinition));
        }
        let array = Array::new(ty, self.base, upper)?;
        self.map.insert(key.to_string(), array);
        self.base_set = true;
        Ok(())
    }

    /// The array for `key`, dimensioned to 10 in each of `rank`
    /// subscripts if it was never DIMmed.
    pub fn get_or_create(&mut self, key: &str, ty: Type, rank: usize) -> Result<&mut Array> {
        if !self.map.contains_key(key) {
            self.create(key, ty, &vec![10; rank])?;
        }
        self.map.get_mut(key).ok_or_else(|| error!(InternalError))
    }

    pub fn get(&self, key: &str) -> Option<&Array> {
        self.map.get(key)
    }

    pub fn erase(&mut self, key: &str) -> Result<Array> {
        self.map.remove(key).ok_or_else(|| error!(IllegalFunctionCall))
    }

    pub fn strings_mut(&mut self) -> impl Iterator<Item = &mut StrDesc> {
        self.map
            .values_mut()
            .flat_map(|a| a.slots.iter_mut())
            .filter_map(|s| match s {
                Slot::String(d) => Some(d),
                _ => None,
            })
    }
}
