//! Error types for the Nova3D engine
//!
//! This module defines the error types used throughout the engine,
//! including device access, shader compilation, reflection, lookups
//! and scene settings parsing.

use std::fmt;

/// Result type for Nova3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (device, command recording, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, shader, id, descriptor, etc.)
    InvalidResource(String),

    /// Initialization failed (render pass, shader manager, subsystems)
    InitializationFailed(String),

    /// Source or cache file missing or unreadable
    FileNotFound(String),

    /// Compiler rejected a shader source or its macro set
    CompileFailed(String),

    /// Compiled binary could not be introspected
    ReflectionFailed(String),

    /// Requested texture, sampler or constant name is unknown to a shader
    LookupMiss(String),

    /// Malformed line in a scene settings file
    ParseFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::FileNotFound(path) => write!(f, "File not found: {}", path),
            Error::CompileFailed(msg) => write!(f, "Shader compilation failed: {}", msg),
            Error::ReflectionFailed(msg) => write!(f, "Shader reflection failed: {}", msg),
            Error::LookupMiss(name) => write!(f, "Binding not found: {}", name),
            Error::ParseFailed(msg) => write!(f, "Settings parse error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
