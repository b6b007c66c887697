//! Structured extraction: one model call mapping the research transcript into
//! a validated `NewsAnalysis`. Validation failure is a first-class outcome
//! routed to the fallback policy, never a panic or silent coercion.

use std::sync::Arc;

use tracing::debug;

use crate::agent::provider::ResearchModel;
use crate::agent::schema::strict_schema;
use crate::analysis::NewsAnalysis;
use crate::error::{AgentError, AgentResult};
use crate::planner::EXTRACTION_SYSTEM_PROMPT;

pub async fn extract_analysis(
    model: &Arc<dyn ResearchModel>,
    location: &str,
    transcript: &str,
) -> AgentResult<NewsAnalysis> {
    if transcript.trim().is_empty() {
        return Err(AgentError::EmptyTranscript);
    }

    let schema = strict_schema::<NewsAnalysis>();
    let input = format!("Location: {location}\n\nAnalysis:\n{transcript}");

    let value = model
        .extract(EXTRACTION_SYSTEM_PROMPT, &input, schema)
        .await
        .map_err(AgentError::Upstream)?;

    let mut analysis: NewsAnalysis =
        serde_json::from_value(value).map_err(|e| AgentError::Schema(e.to_string()))?;

    analysis.fill_date_analyzed();
    analysis.validate().map_err(AgentError::Schema)?;

    debug!(
        headline = %analysis.headline,
        perspectives = analysis.perspectives.len(),
        "extraction validated"
    );

    Ok(analysis)
}
