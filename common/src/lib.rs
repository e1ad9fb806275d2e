//! Common utilities and abstractions for the qparity project.
//!
//! This crate provides the error type shared by every qparity crate.

pub mod error;

pub use error::{CommonError, Diagnose, ErrorCategory, ErrorContext, ErrorSeverity, Result};
