//! # Compile Errors
//!
//! Three kinds of failure leave the pipeline: user errors (bad input, caught
//! either mid-phase or accumulated across a parse phase), wrapped I/O and
//! image errors from the boundary, and internal invariant violations that
//! indicate a compiler bug.

use std::io;

#[derive(Debug)]
pub enum CompileError {
    Io(io::Error),
    Image(image::ImageError),
    Json(serde_json::Error),
    /// Invalid input detected during an algorithmic phase. The message
    /// names the offending source location.
    User(String),
    /// A parse phase finished with accumulated errors; individual messages
    /// were already reported through the diagnostics sink.
    UserErrors { phase: String, count: usize },
    /// An invariant violation. Never caught.
    Internal(String),
}

impl CompileError {
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

impl From<io::Error> for CompileError {
    fn from(err: io::Error) -> Self {
        CompileError::Io(err)
    }
}

impl From<image::ImageError> for CompileError {
    fn from(err: image::ImageError) -> Self {
        CompileError::Image(err)
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::Json(err)
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Io(err) => write!(f, "I/O error: {}", err),
            CompileError::Image(err) => write!(f, "image error: {}", err),
            CompileError::Json(err) => write!(f, "JSON error: {}", err),
            CompileError::User(msg) => write!(f, "{}", msg),
            CompileError::UserErrors { phase, count } => {
                write!(f, "{} failed with {} error(s)", phase, count)
            }
            CompileError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}
