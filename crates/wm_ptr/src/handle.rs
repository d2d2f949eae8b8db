use core::fmt;
use core::num::NonZeroU32;

use crate::{GuestRuntime, PtrError, RuntimeError};

// -----------------------------------------------------------------------------
// RawHandle

/// The untyped owner of one guest allocation.
///
/// Every concrete handle wraps one of these, so the valid/freed state machine
/// lives in exactly one place:
///
/// - `Valid`: `address` is non-zero and the block belongs to this handle.
/// - `Freed`: `address` is 0; every access fails with [`PtrError::InvalidPointer`].
///
/// # Ownership
///
/// A `RawHandle` is the only party allowed to free its block, and it does so
/// only through [`release`](Self::release). Dropping a valid handle does
/// **not** free guest memory; it logs a leak warning instead.
pub struct RawHandle<'a, R: GuestRuntime + ?Sized> {
    runtime: &'a R,
    address: Option<NonZeroU32>,
}

impl<'a, R: GuestRuntime + ?Sized> RawHandle<'a, R> {
    /// Reserve `size` fresh bytes.
    pub fn allocate(runtime: &'a R, size: usize) -> Result<Self, PtrError> {
        let address = NonZeroU32::new(runtime.allocate(size)?)
            .ok_or(RuntimeError::AllocationFailed { size })?;
        log::trace!("allocated {size} guest bytes at {address}");
        Ok(Self {
            runtime,
            address: Some(address),
        })
    }

    /// Take ownership of a block the caller already holds.
    ///
    /// The caller must not free `address` itself afterwards, nor wrap it in a
    /// second handle.
    pub fn from_address(runtime: &'a R, address: u32) -> Result<Self, PtrError> {
        let address = NonZeroU32::new(address).ok_or(PtrError::InvalidPointer)?;
        Ok(Self {
            runtime,
            address: Some(address),
        })
    }

    /// Current address, or 0 once released.
    #[inline]
    pub fn address(&self) -> u32 {
        self.address.map_or(0, NonZeroU32::get)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.address.is_some()
    }

    #[inline]
    pub fn runtime(&self) -> &'a R {
        self.runtime
    }

    /// The address of a valid handle, or [`PtrError::InvalidPointer`].
    #[inline]
    pub fn guard(&self) -> Result<u32, PtrError> {
        self.address
            .map(NonZeroU32::get)
            .ok_or(PtrError::InvalidPointer)
    }

    /// Free the block. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if let Some(address) = self.address.take() {
            self.runtime.release(address.get());
            log::trace!("released guest block at {address}");
        }
    }

    /// Give up ownership without freeing, returning the address (0 if the
    /// handle was already released).
    #[inline]
    pub fn into_address(mut self) -> u32 {
        self.address.take().map_or(0, NonZeroU32::get)
    }
}

impl<R: GuestRuntime + ?Sized> Drop for RawHandle<'_, R> {
    fn drop(&mut self) {
        if let Some(address) = self.address {
            log::warn!("guest block at {address} leaked: handle dropped without `release`");
        }
    }
}

impl<R: GuestRuntime + ?Sized> fmt::Debug for RawHandle<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawHandle")
            .field("address", &self.address())
            .field("valid", &self.is_valid())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Handle

/// The lifecycle shared by every typed handle.
pub trait Handle {
    /// What [`read`](Self::read) materializes on the host.
    type Value;

    /// Current address, or 0 once released.
    fn address(&self) -> u32;

    /// `true` until the handle is released.
    #[inline]
    fn is_valid(&self) -> bool {
        self.address() != 0
    }

    /// Free the allocation; a no-op when already released.
    fn release(&mut self);

    /// Decode the current contents.
    fn read(&self) -> Result<Self::Value, PtrError>;

    /// [`read`](Self::read), then [`release`](Self::release).
    ///
    /// If the read fails the handle is left untouched.
    fn read_then_release(&mut self) -> Result<Self::Value, PtrError> {
        if !self.is_valid() {
            return Err(PtrError::InvalidPointer);
        }
        let value = self.read()?;
        self.release();
        Ok(value)
    }
}

/// Implements [`Handle`] and `Debug` for a struct with a `raw: RawHandle`
/// field and an inherent `read_value` method.
macro_rules! impl_handle {
    ($handle:ident => $value:ty $(, $field:ident)*) => {
        impl<R: $crate::GuestRuntime + ?Sized> $crate::Handle for $handle<'_, R> {
            type Value = $value;

            #[inline]
            fn address(&self) -> u32 {
                self.raw.address()
            }

            #[inline]
            fn release(&mut self) {
                self.raw.release();
            }

            #[inline]
            fn read(&self) -> Result<$value, $crate::PtrError> {
                self.read_value()
            }
        }

        impl<'a, R: $crate::GuestRuntime + ?Sized> $handle<'a, R> {
            /// Give up ownership without freeing, e.g. when the guest takes
            /// over the block.
            #[inline]
            pub fn into_address(self) -> u32 {
                self.raw.into_address()
            }

            /// The runtime this handle allocates from.
            #[inline]
            pub fn runtime(&self) -> &'a R {
                self.raw.runtime()
            }
        }

        impl<R: $crate::GuestRuntime + ?Sized> ::core::fmt::Debug for $handle<'_, R> {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("address", &self.raw.address())
                    .field("valid", &self.raw.is_valid())
                    $(.field(stringify!($field), &self.$field))*
                    .finish()
            }
        }
    };
}

pub(crate) use impl_handle;
