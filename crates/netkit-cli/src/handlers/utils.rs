//! Shared utilities for command handlers

use crate::error::{Error, Result};

/// Split `NAME<sep>VALUE`, trimming both sides; the name must be non-empty
pub fn split_pair(input: &str, separator: char) -> Result<(String, String)> {
    let (name, value) = input.split_once(separator).ok_or_else(|| {
        Error::invalid_args(format!("expected NAME{}VALUE, got '{}'", separator, input))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_args(format!("missing name in '{}'", input)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
