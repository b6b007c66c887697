//! Typed faults for the analysis pipeline.
//!
//! Only two of these ever reach the HTTP boundary: a missing-agent
//! configuration fault (503, handled in `api`) and `FallbackFailed` (500).
//! Everything else is absorbed with degraded behavior along the way.

use thiserror::Error;

/// Errors that can occur while producing a `NewsAnalysis`.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The reasoning or search capability failed at the transport level.
    #[error("upstream capability error: {0}")]
    Upstream(anyhow::Error),

    /// Extraction could not satisfy the validated output shape.
    #[error("schema extraction failed: {0}")]
    Schema(String),

    /// The research loop finished without any usable transcript.
    #[error("research produced no usable transcript")]
    EmptyTranscript,

    /// Both the primary attempt and the default-location retry failed.
    #[error("analysis failed: {primary}; fallback also failed: {fallback}")]
    FallbackFailed { primary: String, fallback: String },
}

impl From<anyhow::Error> for AgentError {
    fn from(e: anyhow::Error) -> Self {
        AgentError::Upstream(e)
    }
}

/// Result alias used throughout the agent modules.
pub type AgentResult<T> = std::result::Result<T, AgentError>;
