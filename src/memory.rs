use crate::{
    trap::{Result, Trap},
    types::Limits,
};
use std::fmt;

/// Bytes per page.
pub const PAGE_SIZE: usize = 65_536;

/// Linear memory of an instance.
///
/// Backed by a zero-filled `Vec<u8>`. Every access is bounds-checked and an
/// out-of-range access traps; nothing is clamped.
#[derive(Clone)]
pub struct Memory {
    data: Vec<u8>,
    max_pages: Option<u32>,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("pages", &self.pages())
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

impl Memory {
    pub fn new(limits: Limits) -> Self {
        Memory {
            data: vec![0u8; limits.min as usize * PAGE_SIZE],
            max_pages: limits.max,
        }
    }

    /// Current size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Current size in pages.
    pub fn pages(&self) -> u32 {
        (self.data.len() / PAGE_SIZE) as u32
    }

    /// Grow by `delta` pages, never beyond the declared maximum or `cap`.
    /// Returns the old page count.
    pub fn grow(&mut self, delta: u32, cap: u32) -> Result<u32> {
        let old_pages = self.pages();
        let new_pages = old_pages.checked_add(delta).ok_or(Trap::OutOfMemory)?;
        let limit = self.max_pages.map_or(cap, |max| max.min(cap));
        if new_pages > limit {
            return Err(Trap::OutOfMemory);
        }
        self.data.resize(new_pages as usize * PAGE_SIZE, 0);
        Ok(old_pages)
    }

    fn check(&self, offset: usize, len: usize) -> Result<()> {
        if offset
            .checked_add(len)
            .map(|end| end <= self.data.len())
            .unwrap_or(false)
        {
            Ok(())
        } else {
            Err(Trap::MemoryAccess {
                offset: offset as u64,
                len,
            })
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        self.check(offset, 1)?;
        Ok(self.data[offset])
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.read_bytes(offset, 4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.read_bytes(offset, 8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.check(offset, len)?;
        Ok(&self.data[offset..offset + len])
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    pub fn write_u8(&mut self, offset: usize, val: u8) -> Result<()> {
        self.check(offset, 1)?;
        self.data[offset] = val;
        Ok(())
    }

    pub fn write_u32(&mut self, offset: usize, val: u32) -> Result<()> {
        self.write_bytes(offset, &val.to_le_bytes())
    }

    pub fn write_u64(&mut self, offset: usize, val: u64) -> Result<()> {
        self.write_bytes(offset, &val.to_le_bytes())
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.check(offset, bytes.len())?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}
