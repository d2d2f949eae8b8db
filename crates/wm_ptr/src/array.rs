use alloc::vec::Vec;

use crate::handle::{RawHandle, impl_handle};
use crate::runtime::offset;
use crate::{GuestRuntime, Kind, PtrError, RuntimeError, Scalar};

// -----------------------------------------------------------------------------
// ArrayHandle

/// Owns `len` contiguous guest slots of one [`Kind`].
///
/// The length is fixed at construction. Every element access is checked
/// against it, and [`read`](crate::Handle::read) always returns exactly `len`
/// values, whether or not each slot was ever written.
///
/// # Examples
///
/// ```no_run
/// # use wm_ptr::{ArrayHandle, Handle, Kind, Scalar};
/// # fn demo<R: wm_ptr::GuestRuntime>(runtime: &R) -> Result<(), wm_ptr::PtrError> {
/// let mut array = ArrayHandle::from_values(runtime, Kind::I32, 3, &[1, 2, 3])?;
///
/// assert!(array.add(3, 4).is_err());
/// assert_eq!(array.get(1)?, Scalar::I32(2));
///
/// let values = array.read_then_release()?;
/// assert_eq!(values.len(), 3);
/// # Ok(())
/// # }
/// ```
pub struct ArrayHandle<'a, R: GuestRuntime + ?Sized> {
    raw: RawHandle<'a, R>,
    kind: Kind,
    len: usize,
}

impl_handle!(ArrayHandle => Vec<Scalar>, kind, len);

impl<'a, R: GuestRuntime + ?Sized> ArrayHandle<'a, R> {
    /// Reserve `len` slots of `kind`.
    ///
    /// Fails with [`RuntimeError::AllocationFailed`] when the array would not
    /// fit in a 32-bit address space.
    pub fn allocate(runtime: &'a R, kind: Kind, len: usize) -> Result<Self, PtrError> {
        let size = len
            .checked_mul(kind.size())
            .filter(|size| u32::try_from(*size).is_ok())
            .ok_or(RuntimeError::AllocationFailed {
                size: len.saturating_mul(kind.size()),
            })?;
        Ok(Self {
            raw: RawHandle::allocate(runtime, size)?,
            kind,
            len,
        })
    }

    /// Reserve `len` slots and fill the front with `values`.
    ///
    /// `values` may be shorter than `len`, but never longer; an oversized
    /// input is rejected before any allocation.
    pub fn from_values<V>(
        runtime: &'a R,
        kind: Kind,
        len: usize,
        values: &[V],
    ) -> Result<Self, PtrError>
    where
        V: Copy + Into<Scalar>,
    {
        check_len(len, values.len())?;
        let mut handle = Self::allocate(runtime, kind, len)?;
        if let Err(err) = handle.write(values) {
            handle.raw.release();
            return Err(err);
        }
        Ok(handle)
    }

    /// Adopt an existing array of `len` slots at `address`.
    ///
    /// The whole array must end inside the 32-bit address space.
    pub fn from_address(
        runtime: &'a R,
        kind: Kind,
        len: usize,
        address: u32,
    ) -> Result<Self, PtrError> {
        offset(address, len.saturating_mul(kind.size()))?;
        Ok(Self {
            raw: RawHandle::from_address(runtime, address)?,
            kind,
            len,
        })
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Number of elements, fixed at construction.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes reserved for the elements.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.len * self.kind.size()
    }

    /// Write `values` into the first `values.len()` slots.
    ///
    /// Every value is checked before memory is touched: more values than
    /// slots fails with [`PtrError::LengthMismatch`], a value that does not
    /// fit the kind with [`PtrError::KindMismatch`]. Slots past the input are
    /// left as they are.
    pub fn write<V>(&mut self, values: &[V]) -> Result<(), PtrError>
    where
        V: Copy + Into<Scalar>,
    {
        let address = self.raw.guard()?;
        check_len(self.len, values.len())?;

        let mut bytes = Vec::with_capacity(values.len() * self.kind.size());
        for value in values {
            let mut buf = [0; 8];
            let value = (*value).into().cast(self.kind)?;
            bytes.extend_from_slice(value.encode(&mut buf));
        }
        self.raw.runtime().write_bytes(address, &bytes)?;
        Ok(())
    }

    /// Write one element.
    ///
    /// Fails with [`PtrError::OutOfBounds`] unless `index < len`, in which
    /// case memory is not touched.
    pub fn add(&mut self, index: usize, value: impl Into<Scalar>) -> Result<(), PtrError> {
        let address = self.element(index)?;
        let value = value.into().cast(self.kind)?;
        self.raw.runtime().write_typed(address, value)?;
        Ok(())
    }

    /// Read one element, with the same bounds check as [`add`](Self::add).
    pub fn get(&self, index: usize) -> Result<Scalar, PtrError> {
        let address = self.element(index)?;
        Ok(self.raw.runtime().read_typed(address, self.kind)?)
    }

    fn element(&self, index: usize) -> Result<u32, PtrError> {
        let address = self.raw.guard()?;
        if index >= self.len {
            return Err(PtrError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(offset(address, index * self.kind.size())?)
    }

    fn read_value(&self) -> Result<Vec<Scalar>, PtrError> {
        let address = self.raw.guard()?;
        let size = self.kind.size();

        let mut bytes = alloc::vec![0; self.byte_len()];
        self.raw.runtime().read_bytes(address, &mut bytes)?;

        Ok(bytes
            .chunks_exact(size)
            .map(|chunk| Scalar::decode(self.kind, chunk))
            .collect())
    }
}

#[inline]
fn check_len(capacity: usize, len: usize) -> Result<(), PtrError> {
    if len > capacity {
        return Err(PtrError::LengthMismatch { capacity, len });
    }
    Ok(())
}
