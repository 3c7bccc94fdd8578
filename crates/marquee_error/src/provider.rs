//! Extraction provider error types.

/// Provider error with source location.
///
/// Raised when a vision extraction backend fails or times out. The pipeline
/// catches these per phase or per consensus member rather than propagating.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", message, line, file)]
pub struct ProviderError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new ProviderError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use marquee_error::ProviderError;
    ///
    /// let err = ProviderError::new("Model timed out after 30s");
    /// assert!(err.message.contains("timed out"));
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
