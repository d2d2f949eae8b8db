//! A minimal bump-allocated guest heap for unit tests.

use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::{GuestRuntime, RuntimeError};

pub(crate) struct MockHeap {
    memory: RefCell<Vec<u8>>,
    top: Cell<u32>,
    pub(crate) freed: RefCell<Vec<u32>>,
}

impl MockHeap {
    /// Memory starts filled with `0xAA` so tests notice missing writes.
    pub(crate) fn new(size: usize) -> Self {
        Self {
            memory: RefCell::new(vec![0xAA; size]),
            top: Cell::new(8),
            freed: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn byte(&self, address: u32) -> u8 {
        self.memory.borrow()[address as usize]
    }

    pub(crate) fn set_byte(&self, address: u32, byte: u8) {
        self.memory.borrow_mut()[address as usize] = byte;
    }

    fn range(&self, address: u32, len: usize) -> Result<core::ops::Range<usize>, RuntimeError> {
        let start = address as usize;
        let end = start + len;
        if end > self.memory.borrow().len() {
            return Err(RuntimeError::AccessOutOfRange { address, len });
        }
        Ok(start..end)
    }
}

impl GuestRuntime for MockHeap {
    fn allocate(&self, size: usize) -> Result<u32, RuntimeError> {
        let address = self.top.get();
        let end = (address as usize)
            .checked_add(size.max(1))
            .filter(|end| *end <= self.memory.borrow().len())
            .ok_or(RuntimeError::AllocationFailed { size })?;
        self.top.set(end.next_multiple_of(8) as u32);
        Ok(address)
    }

    fn release(&self, address: u32) {
        self.freed.borrow_mut().push(address);
    }

    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> Result<(), RuntimeError> {
        let range = self.range(address, buf.len())?;
        buf.copy_from_slice(&self.memory.borrow()[range]);
        Ok(())
    }

    fn write_bytes(&self, address: u32, bytes: &[u8]) -> Result<(), RuntimeError> {
        let range = self.range(address, bytes.len())?;
        self.memory.borrow_mut()[range].copy_from_slice(bytes);
        Ok(())
    }
}
