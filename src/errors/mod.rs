//! # Error Handling
//!
//! This module provides error handling for the extension server.
//! It defines the process-level error type using `thiserror`.

mod types;

pub use types::{Error, Result};
