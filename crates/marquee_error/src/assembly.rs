//! Graph assembly error types.

/// Specific error conditions for graph assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AssemblyErrorKind {
    /// Entity persistence call failed
    #[display("Failed to create {} entity '{}': {}", kind, name, message)]
    EntityCreateFailed {
        /// Entity kind label
        kind: String,
        /// Deterministic entity name
        name: String,
        /// Underlying store error
        message: String,
    },
    /// Relation persistence call failed
    #[display("Failed to create {} relation {} -> {}: {}", kind, from, to, message)]
    RelationCreateFailed {
        /// Relation kind label
        kind: String,
        /// Source entity name
        from: String,
        /// Target entity name
        to: String,
        /// Underlying store error
        message: String,
    },
    /// Entity lookup failed during the existence check
    #[display("Entity lookup failed for '{}': {}", _0, _1)]
    LookupFailed(String, String),
    /// Merged fields lack the minimum needed to assemble anything
    #[display("Nothing to assemble: {}", _0)]
    EmptyEntity(String),
}

/// Error type for graph assembly.
///
/// Assembly sub-steps catch these locally and keep going; partial graph
/// construction is preferable to no result.
///
/// # Examples
///
/// ```
/// use marquee_error::{AssemblyError, AssemblyErrorKind};
///
/// let err = AssemblyError::new(AssemblyErrorKind::EmptyEntity(
///     "no headliner, venue, or title".to_string(),
/// ));
/// assert!(format!("{}", err).contains("Nothing to assemble"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Assembly Error: {} at line {} in {}", kind, line, file)]
pub struct AssemblyError {
    /// The specific error condition
    pub kind: AssemblyErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl AssemblyError {
    /// Create a new AssemblyError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AssemblyErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
