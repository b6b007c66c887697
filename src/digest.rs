//! # Daily Digest Builder
//! Once a day: one search for the top global headlines, then a full analysis
//! pipeline run per headline, strictly sequentially to bound upstream rate.
//! The most expensive operation in the system (linear in headline count),
//! run once per day rather than per request.

use metrics::{counter, gauge};
use tracing::{info, warn};

use crate::agent::search::{source_from_url, SearchHit};
use crate::agent::NewsAgent;
use crate::cache::{today, CacheStore, DailyItem, DailyRecord, Headline};

pub const DAILY_HEADLINE_QUERY: &str = "top 10 global news headlines today";
const DAILY_LOCATION: &str = "Global";

/// Collapse whitespace and decode HTML entities in a search-result title.
pub fn normalize_headline(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw).to_string();
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&decoded, " ").trim().to_string()
}

/// Shape raw search hits into the headline list served by `/search` and used
/// as digest input. Empty titles are dropped; no deduplication here.
pub fn collect_headlines(hits: Vec<SearchHit>) -> Vec<Headline> {
    hits.into_iter()
        .filter_map(|hit| {
            let headline = normalize_headline(&hit.title);
            if headline.is_empty() {
                return None;
            }
            Some(Headline {
                source: source_from_url(&hit.url),
                url: hit.url,
                headline,
            })
        })
        .collect()
}

/// Deduplicate by exact headline text, order preserved as returned.
fn dedup_exact(headlines: Vec<Headline>) -> Vec<Headline> {
    let mut seen = std::collections::HashSet::new();
    headlines
        .into_iter()
        .filter(|h| seen.insert(h.headline.clone()))
        .collect()
}

/// Build today's digest and hand it to the daily store. Per-headline failures
/// are recorded in place and never abort the remaining headlines.
pub async fn refresh_daily_news(agent: &NewsAgent, cache: &CacheStore) -> DailyRecord {
    info!(query = DAILY_HEADLINE_QUERY, "fetching daily headlines");

    let headlines = match agent.web_searcher().search(DAILY_HEADLINE_QUERY, 10).await {
        Ok(hits) => dedup_exact(collect_headlines(hits)),
        Err(e) => {
            warn!(error = %e, "daily headline search failed");
            Vec::new()
        }
    };

    let mut news = Vec::with_capacity(headlines.len());
    for (i, h) in headlines.iter().enumerate() {
        let rank = (i + 1) as u32;
        match agent.analyze(DAILY_LOCATION, Some(&h.headline)).await {
            Ok(analysis) => {
                news.push(DailyItem {
                    rank,
                    headline: h.headline.clone(),
                    analysis: Some(analysis),
                    error: None,
                });
            }
            Err(e) => {
                warn!(rank, headline = %h.headline, error = %e, "headline analysis failed");
                counter!("digest_headline_failures_total").increment(1);
                news.push(DailyItem {
                    rank,
                    headline: h.headline.clone(),
                    analysis: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let record = DailyRecord {
        date: today(),
        fetched_at: chrono::Local::now().to_rfc3339(),
        count: news.len(),
        news,
    };

    cache.write_daily(&record);
    gauge!("daily_digest_last_refresh_ts").set(chrono::Local::now().timestamp() as f64);
    info!(count = record.count, "daily digest refreshed");

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headline(text: &str) -> Headline {
        Headline {
            headline: text.into(),
            source: "example.com".into(),
            url: "https://example.com".into(),
        }
    }

    #[test]
    fn normalize_collapses_whitespace_and_entities() {
        assert_eq!(
            normalize_headline("  Markets&nbsp;&amp; Politics \n today "),
            "Markets & Politics today"
        );
    }

    #[test]
    fn dedup_is_exact_and_order_preserving() {
        let input = vec![
            headline("A"),
            headline("B"),
            headline("A"),
            headline("a"), // different case = different story, kept
            headline("C"),
        ];
        let out = dedup_exact(input);
        let titles: Vec<&str> = out.iter().map(|h| h.headline.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "a", "C"]);
    }

    #[test]
    fn empty_titles_are_dropped() {
        let hits = vec![
            SearchHit {
                title: "   ".into(),
                url: "https://example.com/x".into(),
                snippet: String::new(),
            },
            SearchHit {
                title: "Real story".into(),
                url: "https://example.com/y".into(),
                snippet: String::new(),
            },
        ];
        let out = collect_headlines(hits);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].headline, "Real story");
    }
}
