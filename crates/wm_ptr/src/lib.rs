//! Typed, owned handles over a WebAssembly guest's linear memory.
//!
//! A guest compiled from C exposes a flat heap plus `malloc`/`free`. Each
//! handle in this crate owns exactly one block of that heap and mediates every
//! access to it, adding the checks raw addresses lack:
//!
//! - bounds checks on element and string writes,
//! - a valid/freed state that rejects use after [`release`](Handle::release),
//! - fixed lengths and kinds chosen once at construction.
//!
//! **Handles**
//!
//! - [`ScalarHandle`]: one value of a [`Kind`].
//! - [`ArrayHandle`]: a fixed number of values of one [`Kind`].
//! - [`TextHandle`]: a NUL-terminated UTF-8 buffer of fixed capacity.
//! - [`CharHandle`] / [`FlagHandle`]: a single C `char` / `bool`.
//!
//! All of them implement [`Handle`], built on the shared [`RawHandle`].
//!
//! **Runtime**
//!
//! Handles talk to the guest only through the [`GuestRuntime`] trait, so any
//! runtime adapter that can allocate, free, and copy bytes will do.
//!
//! Release is always explicit. A handle dropped while still valid leaks its
//! block and logs a warning; it never frees guest memory on its own.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod array;
mod byte;
mod error;
mod handle;
mod kind;
mod scalar;
mod scalar_handle;
mod text;

pub mod convert;
pub mod runtime;

#[cfg(test)]
mod testing;

// -----------------------------------------------------------------------------
// Top-level exports

pub use array::ArrayHandle;
pub use byte::{CharHandle, FlagHandle};
pub use error::{ErrorKind, PtrError, RuntimeError};
pub use handle::{Handle, RawHandle};
pub use kind::Kind;
pub use runtime::GuestRuntime;
pub use scalar::{Primitive, Scalar};
pub use scalar_handle::ScalarHandle;
pub use text::TextHandle;
