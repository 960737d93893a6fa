//! Error taxonomy shared by every fallible entry point in the crate.
//!
//! Mirrors the result-code style of C prompt cores (the ecosystem this
//! crate's contract is modelled on) without giving up Rust's `Result`:
//! each variant below is one of the documented result codes, and callers
//! match on `PromptError` instead of an integer.

use std::fmt;

/// The result-code taxonomy. `Success` has no corresponding `Err` value —
/// the absence of an error already means success in `Result<T, PromptError>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptError {
    NullPointer,
    InvalidParameter,
    InvalidState,
    OutOfMemory,
    ResourceExhausted,
    SystemCall,
    NotInitialized,
    FeatureNotAvailable,
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PromptError::NullPointer => "null pointer",
            PromptError::InvalidParameter => "invalid parameter",
            PromptError::InvalidState => "invalid state",
            PromptError::OutOfMemory => "out of memory",
            PromptError::ResourceExhausted => "resource exhausted",
            PromptError::SystemCall => "system call failed",
            PromptError::NotInitialized => "not initialized",
            PromptError::FeatureNotAvailable => "feature not available",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for PromptError {}

pub type PromptResult<T> = Result<T, PromptError>;
