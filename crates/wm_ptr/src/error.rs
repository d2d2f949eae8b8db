use alloc::string::String;

use thiserror::Error;

use crate::{Kind, Scalar};

// -----------------------------------------------------------------------------
// RuntimeError

/// A failure reported by a [`GuestRuntime`](crate::GuestRuntime) primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("guest allocator could not reserve {size} bytes")]
    AllocationFailed { size: usize },

    #[error("guest memory access of {len} bytes at address {address} is out of range")]
    AccessOutOfRange { address: u32, len: usize },

    #[error("guest call failed: {0}")]
    Guest(String),
}

// -----------------------------------------------------------------------------
// PtrError

/// Errors raised by handles and primitive conversions.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PtrError {
    #[error("invalid pointer: the handle was released or never allocated")]
    InvalidPointer,

    #[error("index {index} is out of bounds for array of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("array capacity is {capacity} but {len} values were supplied")]
    LengthMismatch { capacity: usize, len: usize },

    #[error("string needs {required} bytes with its terminator but the buffer holds {capacity}")]
    BufferOverflow { required: usize, capacity: usize },

    #[error("expected exactly one character, found {0}")]
    NotOneChar(usize),

    #[error("unsupported type `{0}`")]
    UnsupportedType(String),

    #[error("cannot store {value:?} in a `{kind}` slot")]
    KindMismatch { kind: Kind, value: Scalar },

    #[error("character code {0} is outside 0..=255")]
    CodeOutOfRange(u32),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Coarse classification of a [`PtrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPointer,
    OutOfBounds,
    LengthMismatch,
    BufferOverflow,
    Validation,
    Range,
    Runtime,
}

impl PtrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PtrError::InvalidPointer => ErrorKind::InvalidPointer,
            PtrError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            PtrError::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            PtrError::BufferOverflow { .. } => ErrorKind::BufferOverflow,
            PtrError::NotOneChar(_)
            | PtrError::UnsupportedType(_)
            | PtrError::KindMismatch { .. } => ErrorKind::Validation,
            PtrError::CodeOutOfRange(_) => ErrorKind::Range,
            PtrError::Runtime(_) => ErrorKind::Runtime,
        }
    }
}
