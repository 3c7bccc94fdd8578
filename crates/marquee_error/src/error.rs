//! Top-level error wrapper types.

use crate::{AssemblyError, ConfigError, ConsensusError, ParseError, PipelineError, ProviderError};

/// This is the foundation error enum for the Marquee workspace.
///
/// # Examples
///
/// ```
/// use marquee_error::{MarqueeError, ProviderError};
///
/// let provider_err = ProviderError::new("Connection failed");
/// let err: MarqueeError = provider_err.into();
/// assert!(format!("{}", err).contains("Provider Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MarqueeErrorKind {
    /// Extraction provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Response parsing error
    #[from(ParseError)]
    Parse(ParseError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Pipeline orchestration error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Consensus processing error
    #[from(ConsensusError)]
    Consensus(ConsensusError),
    /// Graph assembly error
    #[from(AssemblyError)]
    Assembly(AssemblyError),
}

/// Marquee error with kind discrimination.
///
/// # Examples
///
/// ```
/// use marquee_error::{MarqueeResult, ConfigError};
///
/// fn might_fail() -> MarqueeResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Marquee Error: {}", _0)]
pub struct MarqueeError(Box<MarqueeErrorKind>);

impl MarqueeError {
    /// Create a new error from a kind.
    pub fn new(kind: MarqueeErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MarqueeErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to MarqueeErrorKind
impl<T> From<T> for MarqueeError
where
    T: Into<MarqueeErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Marquee operations.
///
/// # Examples
///
/// ```
/// use marquee_error::{MarqueeResult, ProviderError};
///
/// fn extract() -> MarqueeResult<String> {
///     Err(ProviderError::new("429 Too Many Requests"))?
/// }
/// ```
pub type MarqueeResult<T> = std::result::Result<T, MarqueeError>;
