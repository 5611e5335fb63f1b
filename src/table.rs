use crate::{
    trap::{Result, Trap},
    types::Limits,
};

/// A funcref table: each slot is null or a function index of the owning
/// instance. Tables never grow, so only the declared minimum is kept.
#[derive(Debug, Clone)]
pub struct Table {
    elems: Vec<Option<u32>>,
}

impl Table {
    pub fn new(limits: Limits) -> Self {
        Table {
            elems: vec![None; limits.min as usize],
        }
    }

    pub fn size(&self) -> u32 {
        self.elems.len() as u32
    }

    /// Read a slot. `Ok(None)` is a null reference.
    pub fn get(&self, idx: u32) -> Result<Option<u32>> {
        self.elems
            .get(idx as usize)
            .copied()
            .ok_or(Trap::TableAccess(idx))
    }

    pub fn set(&mut self, idx: u32, func: Option<u32>) -> Result<()> {
        let slot = self
            .elems
            .get_mut(idx as usize)
            .ok_or(Trap::TableAccess(idx))?;
        *slot = func;
        Ok(())
    }

    /// Write `funcs` starting at `offset`. Nothing is written unless the
    /// whole range fits.
    pub fn init(&mut self, offset: usize, funcs: &[u32]) -> Result<()> {
        let end = offset
            .checked_add(funcs.len())
            .filter(|&end| end <= self.elems.len())
            .ok_or(Trap::TableAccess(offset.min(u32::MAX as usize) as u32))?;
        for (slot, &func) in self.elems[offset..end].iter_mut().zip(funcs) {
            *slot = Some(func);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_null() {
        let t = Table::new(Limits::at_least(3));
        assert_eq!(t.size(), 3);
        assert_eq!(t.get(2), Ok(None));
    }

    #[test]
    fn set_and_get() {
        let mut t = Table::new(Limits::at_least(1));
        t.set(0, Some(7)).unwrap();
        assert_eq!(t.get(0), Ok(Some(7)));
        assert_eq!(t.set(1, Some(7)), Err(Trap::TableAccess(1)));
        assert_eq!(t.get(1), Err(Trap::TableAccess(1)));
    }

    #[test]
    fn init_is_all_or_nothing() {
        let mut t = Table::new(Limits::at_least(2));
        assert!(t.init(1, &[4, 5]).is_err());
        assert_eq!(t.get(1), Ok(None));
        t.init(0, &[4, 5]).unwrap();
        assert_eq!(t.get(1), Ok(Some(5)));
    }
}
