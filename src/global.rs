use crate::{
    trap::{Result, Trap},
    types::{GlobalType, Val},
};

/// One global slot: its declared type and current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Global {
    ty: GlobalType,
    value: Val,
}

impl Global {
    pub fn ty(&self) -> GlobalType {
        self.ty
    }

    pub fn value(&self) -> Val {
        self.value
    }
}

/// Globals of one instance, indexed imported-first.
///
/// Immutable slots keep their initial value for the lifetime of the
/// instance; mutable ones change only through [`GlobalStore::set`].
#[derive(Debug, Clone, Default)]
pub struct GlobalStore {
    slots: Vec<Global>,
}

impl GlobalStore {
    pub fn new() -> Self {
        GlobalStore { slots: Vec::new() }
    }

    /// Append an initialized slot and return its index.
    pub fn push(&mut self, ty: GlobalType, value: Val) -> Result<u32> {
        if value.ty() != ty.ty {
            return Err(Trap::TypeMismatch);
        }
        self.slots.push(Global { ty, value });
        Ok(self.slots.len() as u32 - 1)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, idx: u32) -> Option<&Global> {
        self.slots.get(idx as usize)
    }

    pub fn get(&self, idx: u32) -> Result<Val> {
        self.slot(idx)
            .map(Global::value)
            .ok_or(Trap::UndefinedGlobal(idx))
    }

    pub fn set(&mut self, idx: u32, value: Val) -> Result<()> {
        let slot = self
            .slots
            .get_mut(idx as usize)
            .ok_or(Trap::UndefinedGlobal(idx))?;
        if !slot.ty.mutable {
            return Err(Trap::ImmutableGlobalWrite(idx));
        }
        if value.ty() != slot.ty.ty {
            return Err(Trap::TypeMismatch);
        }
        slot.value = value;
        Ok(())
    }
}
