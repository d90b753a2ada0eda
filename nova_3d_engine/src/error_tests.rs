//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("Command list closed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("Command list closed"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("Unknown shader id".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("Unknown shader id"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("Bloom targets".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("Bloom targets"));
}

#[test]
fn test_file_not_found_display() {
    let err = Error::FileNotFound("shaders/Missing_ps.glsl".to_string());
    assert_eq!(format!("{}", err), "File not found: shaders/Missing_ps.glsl");
}

#[test]
fn test_compile_failed_display() {
    let err = Error::CompileFailed("unexpected token".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Shader compilation failed"));
    assert!(display.contains("unexpected token"));
}

#[test]
fn test_reflection_failed_display() {
    let err = Error::ReflectionFailed("bad magic".to_string());
    assert!(format!("{}", err).contains("bad magic"));
}

#[test]
fn test_lookup_miss_display() {
    let err = Error::LookupMiss("BloomTexture".to_string());
    assert_eq!(format!("{}", err), "Binding not found: BloomTexture");
}

#[test]
fn test_parse_failed_display() {
    let err = Error::ParseFailed("line 3: bloom needs a value".to_string());
    assert_eq!(format!("{}", err), "Settings parse error: line 3: bloom needs a value");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone() {
    let err1 = Error::LookupMiss("InputTexture".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}

#[test]
fn test_result_alias_propagates() {
    fn inner() -> Result<u32> {
        Err(Error::CompileFailed("x".to_string()))
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert!(matches!(outer(), Err(Error::CompileFailed(_))));
}
