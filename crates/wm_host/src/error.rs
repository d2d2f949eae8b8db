use alloc::string::String;

use thiserror::Error;
use wm_ptr::PtrError;

/// Errors raised while binding a guest module or calling into it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HostError {
    #[error("guest module does not export `{0}` with the expected type")]
    MissingExport(String),

    /// A trap or instantiation failure, with its full cause chain.
    #[error("guest runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Ptr(#[from] PtrError),
}
