use alloc::string::String;

use crate::handle::{RawHandle, impl_handle};
use crate::{GuestRuntime, PtrError};

// -----------------------------------------------------------------------------
// TextHandle

/// Owns a NUL-terminated UTF-8 buffer of fixed capacity.
///
/// # Capacity
///
/// The two constructors count capacity differently:
///
/// - [`allocate(n)`](Self::allocate) reserves exactly `n` bytes; the caller's
///   `n` must already include room for the terminator.
/// - [`from_text(n, text)`](Self::from_text) reserves `n + 1` bytes, so `n`
///   bytes of text always fit.
///
/// [`capacity`](Self::capacity) reports the reserved size in both cases.
///
/// # Examples
///
/// ```no_run
/// # use wm_ptr::{Handle, TextHandle};
/// # fn demo<R: wm_ptr::GuestRuntime>(runtime: &R) -> Result<(), wm_ptr::PtrError> {
/// let mut text = TextHandle::from_text(runtime, 20, "Hi")?;
/// assert_eq!(text.capacity(), 21);
///
/// assert!(text.write("this sentence is too long").is_err());
/// assert_eq!(text.read_then_release()?, "Hi");
/// # Ok(())
/// # }
/// ```
pub struct TextHandle<'a, R: GuestRuntime + ?Sized> {
    raw: RawHandle<'a, R>,
    capacity: usize,
}

impl_handle!(TextHandle => String, capacity);

impl<'a, R: GuestRuntime + ?Sized> TextHandle<'a, R> {
    /// Reserve exactly `capacity` bytes. The buffer is not initialized.
    pub fn allocate(runtime: &'a R, capacity: usize) -> Result<Self, PtrError> {
        Ok(Self {
            raw: RawHandle::allocate(runtime, capacity)?,
            capacity,
        })
    }

    /// Reserve `capacity + 1` bytes and write `text`.
    pub fn from_text(runtime: &'a R, capacity: usize, text: &str) -> Result<Self, PtrError> {
        let mut handle = Self::allocate(runtime, capacity.saturating_add(1))?;
        if let Err(err) = handle.write(text) {
            handle.raw.release();
            return Err(err);
        }
        Ok(handle)
    }

    /// Adopt an existing buffer of `capacity` bytes at `address`.
    pub fn from_address(runtime: &'a R, capacity: usize, address: u32) -> Result<Self, PtrError> {
        Ok(Self {
            raw: RawHandle::from_address(runtime, address)?,
            capacity,
        })
    }

    /// Bytes reserved for the buffer, terminator included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Replace the contents with `text`.
    ///
    /// Fails with [`PtrError::BufferOverflow`], leaving the buffer unchanged,
    /// when the encoded text plus its terminator exceeds the capacity.
    pub fn write(&mut self, text: &str) -> Result<(), PtrError> {
        let address = self.raw.guard()?;
        let runtime = self.raw.runtime();

        let required = runtime.byte_length_utf8(text) + 1;
        if required > self.capacity {
            return Err(PtrError::BufferOverflow {
                required,
                capacity: self.capacity,
            });
        }
        runtime.encode_utf8(text, address, self.capacity)?;
        Ok(())
    }

    fn read_value(&self) -> Result<String, PtrError> {
        let address = self.raw.guard()?;
        Ok(self.raw.runtime().decode_utf8(address)?)
    }
}
