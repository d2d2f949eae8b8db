use crate::handle::{RawHandle, impl_handle};
use crate::{GuestRuntime, Kind, PtrError, Scalar};

// -----------------------------------------------------------------------------
// ScalarHandle

/// Owns a guest slot holding one value of a fixed [`Kind`].
///
/// # Examples
///
/// ```no_run
/// # use wm_ptr::{Handle, Kind, Scalar, ScalarHandle};
/// # fn demo<R: wm_ptr::GuestRuntime>(runtime: &R) -> Result<(), wm_ptr::PtrError> {
/// let mut value = ScalarHandle::from_value(runtime, Kind::I64, 1i64 << 60)?;
/// // ... pass `value.address()` to a guest function ...
/// assert_eq!(value.read_then_release()?, Scalar::I64(1 << 60));
/// # Ok(())
/// # }
/// ```
pub struct ScalarHandle<'a, R: GuestRuntime + ?Sized> {
    raw: RawHandle<'a, R>,
    kind: Kind,
}

impl_handle!(ScalarHandle => Scalar, kind);

impl<'a, R: GuestRuntime + ?Sized> ScalarHandle<'a, R> {
    /// Reserve one slot. Its contents are whatever the guest allocator left.
    pub fn allocate(runtime: &'a R, kind: Kind) -> Result<Self, PtrError> {
        Ok(Self {
            raw: RawHandle::allocate(runtime, kind.size())?,
            kind,
        })
    }

    /// Reserve one slot and store `value` in it.
    ///
    /// The value is checked against `kind` before anything is allocated.
    pub fn from_value(
        runtime: &'a R,
        kind: Kind,
        value: impl Into<Scalar>,
    ) -> Result<Self, PtrError> {
        let value = value.into().cast(kind)?;
        let mut handle = Self::allocate(runtime, kind)?;
        if let Err(err) = handle.write(value) {
            handle.raw.release();
            return Err(err);
        }
        Ok(handle)
    }

    /// Adopt an existing slot at `address`.
    pub fn from_address(runtime: &'a R, kind: Kind, address: u32) -> Result<Self, PtrError> {
        Ok(Self {
            raw: RawHandle::from_address(runtime, address)?,
            kind,
        })
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Store `value`, converted to this handle's kind (see [`Scalar::cast`]).
    pub fn write(&mut self, value: impl Into<Scalar>) -> Result<(), PtrError> {
        let address = self.raw.guard()?;
        let value = value.into().cast(self.kind)?;
        self.raw.runtime().write_typed(address, value)?;
        Ok(())
    }

    fn read_value(&self) -> Result<Scalar, PtrError> {
        let address = self.raw.guard()?;
        Ok(self.raw.runtime().read_typed(address, self.kind)?)
    }
}
