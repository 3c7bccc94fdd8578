//! Pipeline error types.

/// Specific error conditions for pipeline orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Source image file is missing or unreadable
    #[display("Image not found or unreadable: {}", _0)]
    ImageNotFound(String),
    /// Poster type could not be determined; downstream phases depend on it
    #[display("Type classification failed: {}", _0)]
    TypeClassificationFailed(String),
    /// No extraction provider is registered under the requested key
    #[display("No provider registered for model key '{}'", _0)]
    UnknownModelKey(String),
    /// The provider registry is empty
    #[display("No extraction providers registered")]
    NoProviders,
    /// Processing session not found in the context store
    #[display("Session '{}' not found in context store", _0)]
    SessionNotFound(String),
}

/// Error type for pipeline orchestration.
///
/// # Examples
///
/// ```
/// use marquee_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::NoProviders);
/// assert!(format!("{}", err).contains("No extraction providers"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
