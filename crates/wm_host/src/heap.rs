use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::ops::Range;

use foldhash::fast::FixedState;
use hashbrown::HashMap;
use wm_ptr::{GuestRuntime, RuntimeError};

/// Size of one wasm memory page.
pub const PAGE_SIZE: usize = 64 * 1024;

/// A fixed hash seed for the live-block table.
const BLOCK_HASH_STATE: FixedState = FixedState::with_seed(0x6A09_E667_F3BC_C909);

// -----------------------------------------------------------------------------
// HeapConfig

/// Layout options for a [`LinearHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Total bytes of linear memory.
    pub size: usize,
    /// Lowest address handed out; everything below is the null page.
    pub base: u32,
    /// Block alignment, rounded up to a power of two.
    pub align: u32,
    /// Fill fresh blocks with this byte. `None` leaves whatever a previous
    /// owner wrote, like a real `malloc`.
    pub poison: Option<u8>,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            size: PAGE_SIZE,
            base: 16,
            align: 8,
            poison: None,
        }
    }
}

// -----------------------------------------------------------------------------
// LinearHeap

/// An in-process stand-in for a guest module's heap.
///
/// Blocks come from a first-fit free list ordered by address, falling back to
/// a bump pointer. Freed neighbours are merged, and a free region touching the
/// bump pointer is handed back to it.
///
/// # Examples
///
/// ```
/// use wm_host::{HeapConfig, LinearHeap};
/// use wm_ptr::{ArrayHandle, Handle, Kind, Scalar};
///
/// let heap = LinearHeap::new(HeapConfig::default());
/// let mut array = ArrayHandle::from_values(&heap, Kind::I16, 2, &[3i16, 4]).unwrap();
/// assert_eq!(heap.live_allocations(), 1);
///
/// assert_eq!(array.read_then_release().unwrap(), [Scalar::I16(3), Scalar::I16(4)]);
/// assert_eq!(heap.live_allocations(), 0);
/// ```
pub struct LinearHeap {
    config: HeapConfig,
    state: RefCell<HeapState>,
}

struct HeapState {
    memory: Vec<u8>,
    /// First address never handed out by the bump pointer.
    top: u32,
    /// Free blocks below `top`, address -> length.
    free: BTreeMap<u32, u32>,
    /// Live blocks, address -> length.
    live: HashMap<u32, u32, FixedState>,
}

impl LinearHeap {
    pub fn new(config: HeapConfig) -> Self {
        let align = config
            .align
            .max(1)
            .checked_next_power_of_two()
            .unwrap_or(1 << 31);
        // Past the last aligned address the heap is simply empty.
        let base = config
            .base
            .max(1)
            .checked_next_multiple_of(align)
            .unwrap_or(u32::MAX & !(align - 1));
        let size = config.size.min(u32::MAX as usize);
        let config = HeapConfig {
            size,
            base,
            align,
            ..config
        };

        Self {
            config,
            state: RefCell::new(HeapState {
                memory: vec![0; size],
                top: base,
                free: BTreeMap::new(),
                live: HashMap::with_hasher(BLOCK_HASH_STATE),
            }),
        }
    }

    /// A heap of `size` bytes with default layout.
    #[inline]
    pub fn with_size(size: usize) -> Self {
        Self::new(HeapConfig {
            size,
            ..HeapConfig::default()
        })
    }

    /// The normalized configuration in use.
    #[inline]
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    pub fn live_allocations(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Bytes held by live blocks, alignment padding included.
    pub fn bytes_in_use(&self) -> usize {
        self.state.borrow().live.values().map(|len| *len as usize).sum()
    }

    pub fn is_live(&self, address: u32) -> bool {
        self.state.borrow().live.contains_key(&address)
    }

    fn span(&self, address: u32, len: usize) -> Result<Range<usize>, RuntimeError> {
        let start = address as usize;
        start
            .checked_add(len)
            .filter(|end| *end <= self.config.size)
            .map(|end| start..end)
            .ok_or(RuntimeError::AccessOutOfRange { address, len })
    }
}

impl Default for LinearHeap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

impl fmt::Debug for LinearHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LinearHeap")
            .field("config", &self.config)
            .field("top", &state.top)
            .field("live", &state.live.len())
            .field("free", &state.free.len())
            .finish()
    }
}

impl HeapState {
    fn take_free(&mut self, len: u32) -> Option<u32> {
        let (address, block) = self
            .free
            .iter()
            .find(|(_, block)| **block >= len)
            .map(|(address, block)| (*address, *block))?;

        self.free.remove(&address);
        if block > len {
            self.free.insert(address + len, block - len);
        }
        Some(address)
    }

    fn bump(&mut self, len: u32) -> Option<u32> {
        let address = self.top;
        let end = address
            .checked_add(len)
            .filter(|end| *end as usize <= self.memory.len())?;
        self.top = end;
        Some(address)
    }

    fn give_back(&mut self, address: u32, len: u32) {
        let mut start = address;
        let mut len = len;

        if let Some(next) = self.free.remove(&(start + len)) {
            len += next;
        }
        if let Some((&prev, &prev_len)) = self.free.range(..start).next_back()
            && prev + prev_len == start
        {
            self.free.remove(&prev);
            start = prev;
            len += prev_len;
        }

        if start + len == self.top {
            self.top = start;
        } else {
            self.free.insert(start, len);
        }
    }
}

impl GuestRuntime for LinearHeap {
    fn allocate(&self, size: usize) -> Result<u32, RuntimeError> {
        let len = u32::try_from(size.max(1))
            .ok()
            .and_then(|len| len.checked_next_multiple_of(self.config.align))
            .ok_or(RuntimeError::AllocationFailed { size })?;

        let mut state = self.state.borrow_mut();
        let address = match state.take_free(len) {
            Some(address) => address,
            None => state
                .bump(len)
                .ok_or(RuntimeError::AllocationFailed { size })?,
        };
        state.live.insert(address, len);

        if let Some(byte) = self.config.poison {
            let start = address as usize;
            state.memory[start..start + len as usize].fill(byte);
        }
        Ok(address)
    }

    fn release(&self, address: u32) {
        let mut state = self.state.borrow_mut();
        match state.live.remove(&address) {
            Some(len) => state.give_back(address, len),
            None => log::warn!("ignoring free of unknown guest address {address}"),
        }
    }

    fn read_bytes(&self, address: u32, buf: &mut [u8]) -> Result<(), RuntimeError> {
        let range = self.span(address, buf.len())?;
        buf.copy_from_slice(&self.state.borrow().memory[range]);
        Ok(())
    }

    fn write_bytes(&self, address: u32, bytes: &[u8]) -> Result<(), RuntimeError> {
        let range = self.span(address, bytes.len())?;
        self.state.borrow_mut().memory[range].copy_from_slice(bytes);
        Ok(())
    }

    fn decode_utf8(&self, address: u32) -> Result<String, RuntimeError> {
        let state = self.state.borrow();
        let tail = state.memory.get(address as usize..).unwrap_or_default();
        let end = tail
            .iter()
            .position(|byte| *byte == 0)
            .ok_or(RuntimeError::AccessOutOfRange {
                address,
                len: tail.len() + 1,
            })?;
        Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
    }
}
