//! # Research Orchestrator
//! Bounded iterative loop between the reasoning capability and the search
//! capability, modeled as an explicit state machine so the iteration bound
//! and abort path are directly testable.
//!
//! Each run is isolated: a fresh `Conversation` with a unique id, nothing
//! carried over from prior runs. Search failures are not retried here; the
//! error text is appended as evidence and the model decides what to do next.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::provider::{Conversation, ModelTurn, ResearchModel};
use crate::agent::search::{SearchHit, WebSearcher, MAX_SEARCH_RESULTS};
use crate::error::{AgentError, AgentResult};
use crate::planner::RESEARCH_SYSTEM_PROMPT;

/// Loop states, transitioning on model output type.
enum LoopState {
    AwaitingModel,
    AwaitingTool(String),
    Done(String),
    Aborted,
}

/// Outcome of one research run.
#[derive(Debug, Clone)]
pub struct ResearchRun {
    /// Accumulated free text: all tool evidence plus the final answer.
    pub transcript: String,
    pub search_calls: u32,
    /// False when the iteration bound cut the loop short.
    pub completed: bool,
}

pub struct ResearchOrchestrator {
    model: Arc<dyn ResearchModel>,
    searcher: Arc<dyn WebSearcher>,
    max_turns: usize,
    max_results: u32,
}

impl ResearchOrchestrator {
    pub fn new(
        model: Arc<dyn ResearchModel>,
        searcher: Arc<dyn WebSearcher>,
        max_turns: usize,
        max_results: u32,
    ) -> Self {
        Self {
            model,
            searcher,
            max_turns: max_turns.max(1),
            max_results: max_results.min(MAX_SEARCH_RESULTS),
        }
    }

    /// Run the loop until the model finalizes or the bound is hit.
    ///
    /// Exceeding the bound is a non-fatal early stop: whatever evidence was
    /// gathered becomes the (partial) transcript. A run that aborts with no
    /// evidence at all is the one fatal case, since the extractor requires a
    /// non-empty transcript.
    pub async fn run(&self, run_id: &str, instruction: &str) -> AgentResult<ResearchRun> {
        let mut conversation = Conversation::new(run_id, RESEARCH_SYSTEM_PROMPT, instruction);
        let mut evidence = String::new();
        let mut search_calls = 0u32;
        let mut turns = 0usize;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    turns += 1;
                    if turns > self.max_turns {
                        LoopState::Aborted
                    } else {
                        match self.model.next_turn(&conversation).await {
                            Ok(ModelTurn::Search { query }) => LoopState::AwaitingTool(query),
                            Ok(ModelTurn::Final { text }) => LoopState::Done(text),
                            // Model transport failure is unrecoverable for
                            // this request; the fallback policy owns retries.
                            Err(e) => return Err(AgentError::Upstream(e)),
                        }
                    }
                }
                LoopState::AwaitingTool(query) => {
                    search_calls += 1;
                    let block = match self.searcher.search(&query, self.max_results).await {
                        Ok(hits) => {
                            debug!(run_id, %query, hits = hits.len(), "search completed");
                            format_evidence(&query, &hits)
                        }
                        Err(e) => {
                            warn!(run_id, %query, error = %e, "search failed");
                            format!("search failed: {e}")
                        }
                    };
                    conversation.push_assistant(format!("Searching for: \"{query}\""));
                    conversation.push_user(block.clone());
                    evidence.push_str(&block);
                    evidence.push_str("\n\n");
                    LoopState::AwaitingModel
                }
                LoopState::Done(text) => {
                    let mut transcript = evidence;
                    transcript.push_str(&text);
                    if transcript.trim().is_empty() {
                        return Err(AgentError::EmptyTranscript);
                    }
                    return Ok(ResearchRun {
                        transcript,
                        search_calls,
                        completed: true,
                    });
                }
                LoopState::Aborted => {
                    warn!(
                        run_id,
                        max_turns = self.max_turns,
                        search_calls,
                        "research loop hit iteration bound before finalizing"
                    );
                    if evidence.trim().is_empty() {
                        return Err(AgentError::EmptyTranscript);
                    }
                    return Ok(ResearchRun {
                        transcript: evidence,
                        search_calls,
                        completed: false,
                    });
                }
            };
        }
    }
}

fn format_evidence(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("Search results for \"{query}\": no results.");
    }
    let mut out = format!("Search results for \"{query}\":\n");
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({})\n{}\n",
            i + 1,
            hit.title,
            hit.url,
            hit.snippet
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;

    struct FinalizingModel;

    #[async_trait]
    impl ResearchModel for FinalizingModel {
        async fn next_turn(&self, _c: &Conversation) -> anyhow::Result<ModelTurn> {
            Ok(ModelTurn::Final {
                text: "final answer".into(),
            })
        }
        async fn extract(
            &self,
            _system: &str,
            _input: &str,
            _schema: serde_json::Value,
        ) -> anyhow::Result<serde_json::Value> {
            Err(anyhow!("not used"))
        }
        fn name(&self) -> &'static str {
            "finalizing"
        }
    }

    struct NoSearcher;

    #[async_trait]
    impl WebSearcher for NoSearcher {
        async fn search(&self, _q: &str, _n: u32) -> anyhow::Result<Vec<SearchHit>> {
            Err(anyhow!("offline"))
        }
    }

    #[tokio::test]
    async fn immediate_final_answer_is_the_transcript() {
        let orch = ResearchOrchestrator::new(
            Arc::new(FinalizingModel),
            Arc::new(NoSearcher),
            8,
            10,
        );
        let run = orch.run("t_1", "instruction").await.unwrap();
        assert!(run.completed);
        assert_eq!(run.search_calls, 0);
        assert_eq!(run.transcript, "final answer");
    }

    #[test]
    fn evidence_formatting_numbers_hits() {
        let hits = vec![SearchHit {
            title: "Title".into(),
            url: "https://example.com".into(),
            snippet: "snippet".into(),
        }];
        let block = format_evidence("q", &hits);
        assert!(block.starts_with("Search results for \"q\":"));
        assert!(block.contains("1. Title (https://example.com)"));
    }
}
