//! # News Agent
//! The dependency-injected service object behind `/analyze`, `/search` and
//! the daily digest: research loop, structured extraction, and the one-shot
//! degrade-to-default fallback policy.

pub mod extractor;
pub mod orchestrator;
pub mod provider;
pub mod schema;
pub mod search;

use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use tracing::{info, warn};

use crate::analysis::NewsAnalysis;
use crate::config::agent::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::planner::research_instruction;

use extractor::extract_analysis;
use orchestrator::ResearchOrchestrator;
use provider::{OpenAiModel, ResearchModel};
use search::{TavilySearcher, WebSearcher};

pub struct NewsAgent {
    model: Arc<dyn ResearchModel>,
    searcher: Arc<dyn WebSearcher>,
    orchestrator: ResearchOrchestrator,
    fallback_location: String,
}

impl NewsAgent {
    /// Wire the agent from injected capabilities. Tests pass scripted stubs;
    /// production goes through [`bootstrap`].
    pub fn new(
        model: Arc<dyn ResearchModel>,
        searcher: Arc<dyn WebSearcher>,
        cfg: &AgentConfig,
    ) -> Self {
        let orchestrator = ResearchOrchestrator::new(
            Arc::clone(&model),
            Arc::clone(&searcher),
            cfg.max_turns,
            cfg.max_search_results,
        );
        Self {
            model,
            searcher,
            orchestrator,
            fallback_location: cfg.fallback_location.clone(),
        }
    }

    /// The search capability, exposed for the digest builder and `/search`.
    pub fn web_searcher(&self) -> Arc<dyn WebSearcher> {
        Arc::clone(&self.searcher)
    }

    /// One full attempt: research loop, then structured extraction.
    pub async fn analyze(&self, location: &str, topic: Option<&str>) -> AgentResult<NewsAnalysis> {
        let started = Instant::now();
        let run_id = run_id(location);
        let instruction = research_instruction(location, topic);

        info!(run_id = %run_id, location, topic = topic.unwrap_or("<top story>"), "analysis started");
        counter!("analysis_attempts_total").increment(1);

        let run = self.orchestrator.run(&run_id, &instruction).await?;
        counter!("research_search_calls_total").increment(run.search_calls as u64);

        let analysis = extract_analysis(&self.model, location, &run.transcript).await?;

        info!(
            run_id = %run_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            searches = run.search_calls,
            completed = run.completed,
            "analysis finished"
        );

        Ok(analysis)
    }

    /// Wrap one attempt with the fallback policy: on any failure, exactly one
    /// retry with the fixed default location, keeping the topic. Both failing
    /// collapse into a single combined fault.
    pub async fn analyze_with_fallback(
        &self,
        location: &str,
        topic: Option<&str>,
    ) -> AgentResult<NewsAnalysis> {
        let primary = match self.analyze(location, topic).await {
            Ok(analysis) => return Ok(analysis),
            Err(e) => e,
        };

        warn!(
            location,
            error = %primary,
            fallback = %self.fallback_location,
            "primary analysis failed, retrying with fallback location"
        );
        counter!("analysis_fallbacks_total").increment(1);

        match self.analyze(&self.fallback_location, topic).await {
            Ok(analysis) => Ok(analysis),
            Err(fallback) => Err(AgentError::FallbackFailed {
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            }),
        }
    }
}

/// Fresh conversation scope per run: location plus wall-clock millis.
fn run_id(location: &str) -> String {
    format!(
        "{}_{}",
        location.replace(char::is_whitespace, "-"),
        chrono::Local::now().timestamp_millis()
    )
}

/// Build the production agent, or `None` when credentials are missing; the
/// process still starts and the affected endpoints answer 503.
pub fn bootstrap(cfg: &AgentConfig) -> Option<Arc<NewsAgent>> {
    if !cfg.enabled {
        warn!("agent disabled in config");
        return None;
    }
    if !cfg.has_credentials() {
        warn!("OPENAI_API_KEY / TAVILY_API_KEY missing; analysis endpoints disabled");
        return None;
    }

    let model: Arc<dyn ResearchModel> = Arc::new(OpenAiModel::new(&cfg.llm_api_key, &cfg.model));
    let searcher: Arc<dyn WebSearcher> = Arc::new(TavilySearcher::new(&cfg.search_api_key));

    info!(model = %cfg.model, max_turns = cfg.max_turns, "news agent initialized");
    Some(Arc::new(NewsAgent::new(model, searcher, cfg)))
}
