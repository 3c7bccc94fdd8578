//! Response parsing error types.

/// Parse error with source location.
///
/// Raised when a model response contains no usable structured data. Phases
/// recover from these locally with conservative defaults.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Parse Error: {} at line {} in {}", message, line, file)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ParseError {
    /// Create a new ParseError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use marquee_error::ParseError;
    ///
    /// let err = ParseError::new("No JSON found in response");
    /// assert!(err.message.contains("JSON"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
