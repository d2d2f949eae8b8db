//! Guest runtimes for [`wm_ptr`] handles.
//!
//! - [`LinearHeap`]: an in-process heap with `malloc`/`free` semantics, for
//!   hosts without a wasm engine and for tests.
//! - `WasmtimeGuest` (feature `wasmtime`): a live module instance, reached
//!   through its exported memory and allocator.
//!
//! Both implement [`GuestRuntime`](wm_ptr::GuestRuntime), so every handle type
//! works unchanged on either.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod heap;

#[cfg(feature = "wasmtime")]
mod instance;

#[cfg(test)]
mod scenarios;

// -----------------------------------------------------------------------------
// Top-level exports

pub use error::HostError;
pub use heap::{HeapConfig, LinearHeap, PAGE_SIZE};

#[cfg(feature = "wasmtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "wasmtime")))]
pub use instance::{GuestExports, WasmtimeGuest};

pub use wm_ptr;
