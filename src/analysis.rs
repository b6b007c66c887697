//! # Analysis Data Model
//! The validated output shape of the pipeline: one `NewsAnalysis` per story,
//! holding at least two opposing `Perspective`s with attributed sources.
//!
//! Constructed once by the extractor, validated, then treated as immutable:
//! either returned to the caller or serialized into the daily cache.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Kind of outlet or platform a citation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    MainstreamMedia,
    IndependentJournalist,
    SocialMedia,
    Government,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PoliticalLeaning {
    Left,
    Center,
    Right,
    Unknown,
}

/// A cited news source. The URL is expected to be non-empty whenever the
/// source backs a claim; a missing URL marks the citation low-quality but
/// does not drop it (display policy is the consumer's call).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewsSource {
    /// Name of the news organization or platform.
    pub name: String,
    /// URL to the article or source.
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub political_leaning: PoliticalLeaning,
}

/// Who supports or funds the sources behind one perspective.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SupporterInfo {
    /// Political parties, governments, corporations.
    pub supporters: Vec<String>,
    pub funding_sources: Vec<String>,
    /// Who owns or controls these outlets.
    pub ownership: String,
}

/// One coherent side of the story.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Perspective {
    /// E.g. "Pro-Government", "Opposition", "Left-Wing", "Right-Wing".
    pub side_name: String,
    pub summary: String,
    pub key_claims: Vec<String>,
    /// Sources presenting this perspective; 3-5 is the research target.
    pub sources: Vec<NewsSource>,
    pub supporter_info: SupporterInfo,
    /// Loaded language, omissions, framing, selective facts.
    pub bias_indicators: Vec<String>,
    /// 0 (neutral) to 10 (highly biased).
    pub bias_score: f64,
}

/// Complete multi-perspective analysis of one news story.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewsAnalysis {
    pub location: String,
    pub topic: String,
    /// Neutral headline summarizing the story.
    pub headline: String,
    pub date_analyzed: String,
    /// Opposing viewpoints; minimum 2.
    pub perspectives: Vec<Perspective>,
    /// Facts agreed upon by all sides.
    pub common_facts: Vec<String>,
    pub key_disagreements: Vec<String>,
    /// Independent journalists and social media voices.
    pub social_media_voices: Vec<NewsSource>,
    /// Neutral summary of the situation and the viewpoints.
    pub summary: String,
    /// Assessment of information quality and reliability.
    pub information_quality: String,
}

impl NewsAnalysis {
    /// Post-extraction invariant check. Out-of-range values are treated as an
    /// extraction fault, not clamped. Sources without a URL are kept and only
    /// logged as a quality warning.
    pub fn validate(&self) -> Result<(), String> {
        if self.perspectives.len() < 2 {
            return Err(format!(
                "expected at least 2 perspectives, got {}",
                self.perspectives.len()
            ));
        }
        for p in &self.perspectives {
            if !(0.0..=10.0).contains(&p.bias_score) || !p.bias_score.is_finite() {
                return Err(format!(
                    "bias_score {} for '{}' outside [0,10]",
                    p.bias_score, p.side_name
                ));
            }
        }

        let missing_urls = self
            .perspectives
            .iter()
            .flat_map(|p| p.sources.iter())
            .chain(self.social_media_voices.iter())
            .filter(|s| s.url.trim().is_empty())
            .count();
        if missing_urls > 0 {
            warn!(
                missing_urls,
                headline = %self.headline,
                "analysis cites sources without URLs"
            );
        }

        Ok(())
    }

    /// Backfill `date_analyzed` when the extractor left it empty.
    pub fn fill_date_analyzed(&mut self) {
        if self.date_analyzed.trim().is_empty() {
            self.date_analyzed = chrono::Local::now().to_rfc3339();
        }
    }
}
