//! Structured extraction invariants.
//!
//! The model capability is stubbed to return a fixed JSON payload; the tests
//! pin down which payloads pass validation and which become schema faults.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value};

use news_perspective_analyzer::agent::extractor::extract_analysis;
use news_perspective_analyzer::agent::provider::{Conversation, ModelTurn, ResearchModel};
use news_perspective_analyzer::error::AgentError;

/// Returns the canned payload from `extract`; `next_turn` is never called.
struct CannedExtractor {
    payload: Value,
}

#[async_trait]
impl ResearchModel for CannedExtractor {
    async fn next_turn(&self, _c: &Conversation) -> anyhow::Result<ModelTurn> {
        Err(anyhow!("not used"))
    }
    async fn extract(
        &self,
        _system: &str,
        _input: &str,
        _schema: Value,
    ) -> anyhow::Result<Value> {
        Ok(self.payload.clone())
    }
    fn name(&self) -> &'static str {
        "canned"
    }
}

fn source(url: &str) -> Value {
    json!({
        "name": "Example Times",
        "url": url,
        "type": "mainstream_media",
        "political_leaning": "center"
    })
}

fn perspective(side: &str, bias: f64, url: &str) -> Value {
    json!({
        "side_name": side,
        "summary": "What this side argues.",
        "key_claims": ["claim one"],
        "sources": [source(url)],
        "supporter_info": {
            "supporters": ["Some Party"],
            "funding_sources": ["Some Fund"],
            "ownership": "Example Corp"
        },
        "bias_indicators": ["loaded language"],
        "bias_score": bias
    })
}

fn analysis_payload(perspectives: Vec<Value>, date: &str) -> Value {
    json!({
        "location": "United States",
        "topic": "test topic",
        "headline": "Neutral headline",
        "date_analyzed": date,
        "perspectives": perspectives,
        "common_facts": ["a fact"],
        "key_disagreements": ["a disagreement"],
        "social_media_voices": [source("https://example.com/social")],
        "summary": "Balanced summary.",
        "information_quality": "mixed"
    })
}

async fn run_extract(payload: Value) -> Result<news_perspective_analyzer::NewsAnalysis, AgentError> {
    let model: Arc<dyn ResearchModel> = Arc::new(CannedExtractor { payload });
    extract_analysis(&model, "United States", "research transcript").await
}

#[tokio::test]
async fn conformant_payload_passes() {
    let payload = analysis_payload(
        vec![
            perspective("Side A", 3.0, "https://example.com/a"),
            perspective("Side B", 7.5, "https://example.com/b"),
        ],
        "2025-06-01T12:00:00Z",
    );
    let analysis = run_extract(payload).await.expect("valid analysis");
    assert!(analysis.perspectives.len() >= 2);
    for p in &analysis.perspectives {
        assert!((0.0..=10.0).contains(&p.bias_score));
    }
}

#[tokio::test]
async fn single_perspective_is_a_schema_fault() {
    let payload = analysis_payload(
        vec![perspective("Only Side", 2.0, "https://example.com/a")],
        "2025-06-01T12:00:00Z",
    );
    let err = run_extract(payload).await.unwrap_err();
    match err {
        AgentError::Schema(msg) => assert!(msg.contains("at least 2"), "got: {msg}"),
        other => panic!("expected schema fault, got {other:?}"),
    }
}

#[tokio::test]
async fn out_of_range_bias_is_a_schema_fault_not_a_clamp() {
    let payload = analysis_payload(
        vec![
            perspective("Side A", 11.0, "https://example.com/a"),
            perspective("Side B", 2.0, "https://example.com/b"),
        ],
        "2025-06-01T12:00:00Z",
    );
    let err = run_extract(payload).await.unwrap_err();
    assert!(matches!(err, AgentError::Schema(_)));
}

#[tokio::test]
async fn empty_date_is_backfilled() {
    let payload = analysis_payload(
        vec![
            perspective("Side A", 1.0, "https://example.com/a"),
            perspective("Side B", 2.0, "https://example.com/b"),
        ],
        "",
    );
    let analysis = run_extract(payload).await.unwrap();
    assert!(!analysis.date_analyzed.trim().is_empty());
}

#[tokio::test]
async fn url_less_source_is_kept() {
    let payload = analysis_payload(
        vec![
            perspective("Side A", 1.0, ""),
            perspective("Side B", 2.0, "https://example.com/b"),
        ],
        "2025-06-01T12:00:00Z",
    );
    let analysis = run_extract(payload).await.expect("low-quality but valid");
    assert_eq!(analysis.perspectives[0].sources.len(), 1);
    assert!(analysis.perspectives[0].sources[0].url.is_empty());
}

#[tokio::test]
async fn malformed_payload_is_a_schema_fault() {
    let err = run_extract(json!({"unexpected": "shape"})).await.unwrap_err();
    assert!(matches!(err, AgentError::Schema(_)));
}

#[tokio::test]
async fn empty_transcript_never_reaches_the_model() {
    let model: Arc<dyn ResearchModel> = Arc::new(CannedExtractor {
        payload: json!({}),
    });
    let err = extract_analysis(&model, "United States", "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::EmptyTranscript));
}
