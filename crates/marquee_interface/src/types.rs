//! Type definitions for the Marquee interface.

use serde::Serialize;

/// Information about an extraction model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Model identifier (e.g., "qwen2.5-vl-7b")
    pub name: String,
    /// Provider name (e.g., "ollama", "openai")
    pub provider: &'static str,
}
