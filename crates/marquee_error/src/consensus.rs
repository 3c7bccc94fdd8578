//! Consensus processing error types.

/// Specific error conditions for cross-provider consensus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ConsensusErrorKind {
    /// Fewer than one provider was supplied
    #[display("Consensus requires at least one provider")]
    EmptyProviderList,
    /// Every provider failed or timed out
    #[display("All {} consensus providers failed", _0)]
    AllProvidersFailed(usize),
    /// Agreement ratio outside [0, 1]
    #[display("Invalid min_agreement_ratio {}: must be within [0, 1]", _0)]
    InvalidAgreementRatio(String),
}

/// Error type for consensus operations.
///
/// Note: total consensus failure is usually reported as a structured field on
/// the consensus result so the orchestrator can fall back to single-provider
/// processing; this type covers configuration-level misuse.
///
/// # Examples
///
/// ```
/// use marquee_error::{ConsensusError, ConsensusErrorKind};
///
/// let err = ConsensusError::new(ConsensusErrorKind::EmptyProviderList);
/// assert!(format!("{}", err).contains("at least one"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Consensus Error: {} at line {} in {}", kind, line, file)]
pub struct ConsensusError {
    /// The specific error condition
    pub kind: ConsensusErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ConsensusError {
    /// Create a new ConsensusError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConsensusErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
