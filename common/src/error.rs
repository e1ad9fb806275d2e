//! Error handling for the qparity-common crate.

use thiserror::Error;

/// Common error type shared by every qparity crate.
///
/// Each variant carries a human-readable message and an optional source error,
/// so failures raised by collaborators (query engines, completion services)
/// keep their full chain.
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Malformed input: {message}")]
    MalformedInput {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Type error: {message}")]
    TypeError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Conversion failed: {message}")]
    ConversionError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Query execution failed: {message}")]
    ExecutionError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Completion request failed: {message}")]
    CompletionError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Invalid configuration: {message}")]
    ConfigurationError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Result type alias for common operations.
pub type Result<T> = std::result::Result<T, CommonError>;

/// Error severity levels for categorizing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Low severity - the caller can fall back to another path
    Low,
    /// Medium severity - the operation may succeed if tried again
    Medium,
    /// High severity - the operation must be aborted
    High,
    /// Critical severity - an internal invariant was broken
    Critical,
}

/// Error category for grouping related error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller handed over data that violates its own declared shape or types
    Input,
    /// Failures while converting between data representations
    DataProcessing,
    /// Failures reported by an external collaborator
    External,
    /// Configuration and setup errors
    Configuration,
    /// Internal logic errors
    Internal,
}

/// Trait for error diagnostics.
pub trait Diagnose {
    /// Get the error severity level.
    fn severity(&self) -> ErrorSeverity;

    /// Get the error category.
    fn category(&self) -> ErrorCategory;

    /// Check if the error is retryable.
    fn is_retryable(&self) -> bool;
}

impl CommonError {
    /// Create a malformed-input error with a custom message.
    pub fn malformed_input<S: Into<String>>(message: S) -> Self {
        Self::MalformedInput {
            message: message.into(),
            source: None,
        }
    }

    /// Create a type error with a custom message.
    pub fn type_error<S: Into<String>>(message: S) -> Self {
        Self::TypeError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a conversion error with a custom message.
    pub fn conversion_error<S: Into<String>>(message: S) -> Self {
        Self::ConversionError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a conversion error with a custom message and source error.
    pub fn conversion_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::ConversionError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an execution error with a custom message.
    pub fn execution_error<S: Into<String>>(message: S) -> Self {
        Self::ExecutionError {
            message: message.into(),
            source: None,
        }
    }

    /// Create an execution error with a custom message and source error.
    pub fn execution_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::ExecutionError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a completion error with a custom message.
    pub fn completion_error<S: Into<String>>(message: S) -> Self {
        Self::CompletionError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a completion error with a custom message and source error.
    pub fn completion_error_with_source<S: Into<String>, E: Into<anyhow::Error>>(
        message: S,
        source: E,
    ) -> Self {
        Self::CompletionError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a configuration error with a custom message.
    pub fn configuration_error<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error with a custom message.
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
            source: None,
        }
    }

    /// The message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            CommonError::MalformedInput { message, .. }
            | CommonError::TypeError { message, .. }
            | CommonError::ConversionError { message, .. }
            | CommonError::ExecutionError { message, .. }
            | CommonError::CompletionError { message, .. }
            | CommonError::ConfigurationError { message, .. }
            | CommonError::InternalError { message, .. } => message,
        }
    }
}

impl Diagnose for CommonError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            CommonError::MalformedInput { .. } => ErrorSeverity::High,
            CommonError::TypeError { .. } => ErrorSeverity::High,
            CommonError::ConversionError { .. } => ErrorSeverity::Medium,
            CommonError::ExecutionError { .. } => ErrorSeverity::Medium,
            CommonError::CompletionError { .. } => ErrorSeverity::Medium,
            CommonError::ConfigurationError { .. } => ErrorSeverity::High,
            CommonError::InternalError { .. } => ErrorSeverity::Critical,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            CommonError::MalformedInput { .. } => ErrorCategory::Input,
            CommonError::TypeError { .. } => ErrorCategory::Input,
            CommonError::ConversionError { .. } => ErrorCategory::DataProcessing,
            CommonError::ExecutionError { .. } => ErrorCategory::External,
            CommonError::CompletionError { .. } => ErrorCategory::External,
            CommonError::ConfigurationError { .. } => ErrorCategory::Configuration,
            CommonError::InternalError { .. } => ErrorCategory::Internal,
        }
    }

    fn is_retryable(&self) -> bool {
        // Only collaborators can fail transiently; comparison is deterministic.
        matches!(
            self,
            CommonError::ExecutionError { .. } | CommonError::CompletionError { .. }
        )
    }
}

/// Context helpers for adding context to errors raised by other libraries.
pub mod context {
    use super::*;

    /// Extension trait for adding context to Results.
    pub trait ErrorContext<T> {
        /// Wrap the error as a query execution failure.
        fn with_execution_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String;

        /// Wrap the error as a completion service failure.
        fn with_completion_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String;

        /// Wrap the error as a data conversion failure.
        fn with_conversion_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String;
    }

    impl<T, E> ErrorContext<T> for std::result::Result<T, E>
    where
        E: Into<anyhow::Error>,
    {
        fn with_execution_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String,
        {
            self.map_err(|e| CommonError::execution_error_with_source(f(), e.into()))
        }

        fn with_completion_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String,
        {
            self.map_err(|e| CommonError::completion_error_with_source(f(), e.into()))
        }

        fn with_conversion_context<F>(self, f: F) -> Result<T>
        where
            F: FnOnce() -> String,
        {
            self.map_err(|e| CommonError::conversion_error_with_source(f(), e.into()))
        }
    }
}

pub use context::ErrorContext;
