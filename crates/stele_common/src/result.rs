//! Common result and error types for the stele toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a bug in stele, not a problem with user input. Problems
/// with interface text are reported through a
/// [`DiagnosticSink`](../stele_diagnostics) and the operation still returns `Ok`.
pub type SteleResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in stele, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("slot released twice");
        assert_eq!(format!("{err}"), "internal error: slot released twice");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
