use crate::convert;
use crate::handle::{RawHandle, impl_handle};
use crate::{GuestRuntime, PtrError};

#[inline]
fn store<R: GuestRuntime + ?Sized>(raw: &RawHandle<'_, R>, byte: u8) -> Result<(), PtrError> {
    let address = raw.guard()?;
    raw.runtime().write_bytes(address, &[byte])?;
    Ok(())
}

#[inline]
fn load<R: GuestRuntime + ?Sized>(raw: &RawHandle<'_, R>) -> Result<u8, PtrError> {
    let address = raw.guard()?;
    let mut byte = [0];
    raw.runtime().read_bytes(address, &mut byte)?;
    Ok(byte[0])
}

// -----------------------------------------------------------------------------
// CharHandle

/// Owns one C `char`, seen from the host as a Latin-1 [`char`].
///
/// ```no_run
/// # use wm_ptr::{CharHandle, Handle};
/// # fn demo<R: wm_ptr::GuestRuntime>(runtime: &R) -> Result<(), wm_ptr::PtrError> {
/// assert!(CharHandle::from_text(runtime, "ab").is_err());
///
/// let mut ch = CharHandle::from_text(runtime, "a")?;
/// assert_eq!(ch.read_then_release()?, 'a');
/// # Ok(())
/// # }
/// ```
pub struct CharHandle<'a, R: GuestRuntime + ?Sized> {
    raw: RawHandle<'a, R>,
}

impl_handle!(CharHandle => char);

impl<'a, R: GuestRuntime + ?Sized> CharHandle<'a, R> {
    /// Reserve one byte and clear it to `'\0'`.
    pub fn allocate(runtime: &'a R) -> Result<Self, PtrError> {
        Self::with_byte(runtime, 0)
    }

    pub fn from_char(runtime: &'a R, ch: char) -> Result<Self, PtrError> {
        Self::with_byte(runtime, convert::char_to_byte(ch)?)
    }

    /// Like [`from_char`](Self::from_char), for a string that must hold
    /// exactly one character.
    pub fn from_text(runtime: &'a R, text: &str) -> Result<Self, PtrError> {
        Self::with_byte(runtime, convert::str_to_byte(text)?)
    }

    pub fn from_address(runtime: &'a R, address: u32) -> Result<Self, PtrError> {
        Ok(Self {
            raw: RawHandle::from_address(runtime, address)?,
        })
    }

    fn with_byte(runtime: &'a R, byte: u8) -> Result<Self, PtrError> {
        let mut handle = Self {
            raw: RawHandle::allocate(runtime, 1)?,
        };
        if let Err(err) = store(&handle.raw, byte) {
            handle.raw.release();
            return Err(err);
        }
        Ok(handle)
    }

    pub fn write(&mut self, ch: char) -> Result<(), PtrError> {
        self.raw.guard()?;
        store(&self.raw, convert::char_to_byte(ch)?)
    }

    pub fn write_text(&mut self, text: &str) -> Result<(), PtrError> {
        self.raw.guard()?;
        store(&self.raw, convert::str_to_byte(text)?)
    }

    fn read_value(&self) -> Result<char, PtrError> {
        convert::byte_to_char(load(&self.raw)? as u32)
    }
}

// -----------------------------------------------------------------------------
// FlagHandle

/// Owns one C `bool`.
///
/// Reads are permissive: any non-zero byte is `true`.
pub struct FlagHandle<'a, R: GuestRuntime + ?Sized> {
    raw: RawHandle<'a, R>,
}

impl_handle!(FlagHandle => bool);

impl<'a, R: GuestRuntime + ?Sized> FlagHandle<'a, R> {
    /// Reserve one byte and set it to `false`; fresh guest memory is not
    /// guaranteed to be zeroed.
    pub fn allocate(runtime: &'a R) -> Result<Self, PtrError> {
        Self::from_bool(runtime, false)
    }

    pub fn from_bool(runtime: &'a R, value: bool) -> Result<Self, PtrError> {
        let mut handle = Self {
            raw: RawHandle::allocate(runtime, 1)?,
        };
        if let Err(err) = handle.write(value) {
            handle.raw.release();
            return Err(err);
        }
        Ok(handle)
    }

    pub fn from_address(runtime: &'a R, address: u32) -> Result<Self, PtrError> {
        Ok(Self {
            raw: RawHandle::from_address(runtime, address)?,
        })
    }

    pub fn write(&mut self, value: bool) -> Result<(), PtrError> {
        store(&self.raw, convert::bool_to_byte(value))
    }

    fn read_value(&self) -> Result<bool, PtrError> {
        load(&self.raw).map(convert::byte_to_bool)
    }
}
