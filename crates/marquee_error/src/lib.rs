//! Error types for the Marquee extraction pipeline.
//!
//! This crate provides the foundation error types used throughout the Marquee
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use marquee_error::{MarqueeResult, ProviderError};
//!
//! fn call_model() -> MarqueeResult<String> {
//!     Err(ProviderError::new("Vision backend unavailable"))?
//! }
//!
//! match call_model() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assembly;
mod config;
mod consensus;
mod error;
mod parse;
mod pipeline;
mod provider;

pub use assembly::{AssemblyError, AssemblyErrorKind};
pub use config::ConfigError;
pub use consensus::{ConsensusError, ConsensusErrorKind};
pub use error::{MarqueeError, MarqueeErrorKind, MarqueeResult};
pub use parse::ParseError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use provider::ProviderError;
