use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::agent::NewsAgent;
use crate::cache::{today, CacheStore, Headline, TopicEntry};
use crate::digest::collect_headlines;

#[derive(Clone)]
pub struct AppState {
    /// `None` when upstream credentials are missing; the process still serves
    /// health/examples/daily-news, and analysis endpoints answer 503.
    pub agent: Option<Arc<NewsAgent>>,
    pub cache: Arc<CacheStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/examples", get(examples))
        .route("/analyze", post(analyze))
        .route("/search", post(search_topic))
        .route("/daily-news", get(daily_news))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Error body shape shared by all non-2xx responses.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
        .into_response()
}

fn agent_unavailable() -> Response {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "Agent not initialized. Please set OPENAI_API_KEY and TAVILY_API_KEY \
         environment variables.",
    )
}

// ------------------------------------------------------------
// POST /analyze
// ------------------------------------------------------------

#[derive(Deserialize)]
struct AnalyzeRequest {
    location: String,
    #[serde(default)]
    topic: Option<String>,
}

async fn analyze(State(state): State<AppState>, Json(req): Json<AnalyzeRequest>) -> Response {
    let Some(agent) = state.agent else {
        return agent_unavailable();
    };
    if req.location.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "location must be non-empty");
    }

    match agent
        .analyze_with_fallback(req.location.trim(), req.topic.as_deref())
        .await
    {
        Ok(analysis) => Json(analysis).into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error analyzing news: {e}"),
        ),
    }
}

// ------------------------------------------------------------
// POST /search
// ------------------------------------------------------------

#[derive(Deserialize)]
struct SearchRequest {
    topic: String,
}

#[derive(Serialize)]
struct SearchResponse {
    topic: String,
    searched_at: String,
    count: usize,
    headlines: Vec<Headline>,
}

async fn search_topic(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> Response {
    let Some(agent) = state.agent else {
        return agent_unavailable();
    };
    let topic = req.topic.trim().to_string();
    if topic.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "topic must be non-empty");
    }

    if let Some(entry) = state.cache.read_topic(&topic) {
        counter!("topic_cache_hits_total").increment(1);
        return search_response("HIT", &topic, entry);
    }
    counter!("topic_cache_misses_total").increment(1);

    let query = format!("latest news headlines about {topic}");
    let headlines = match agent.web_searcher().search(&query, 10).await {
        Ok(hits) => collect_headlines(hits),
        Err(e) => {
            warn!(%topic, error = %e, "topic search failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error searching news: {e}"),
            );
        }
    };

    let entry = TopicEntry {
        date: today(),
        searched_at: chrono::Local::now().to_rfc3339(),
        headlines,
    };
    state.cache.write_topic(&topic, &entry);

    search_response("MISS", &topic, entry)
}

fn search_response(cache_signal: &'static str, topic: &str, entry: TopicEntry) -> Response {
    (
        AppendHeaders([("X-Topic-Cache", cache_signal)]),
        Json(SearchResponse {
            topic: topic.to_string(),
            searched_at: entry.searched_at,
            count: entry.headlines.len(),
            headlines: entry.headlines,
        }),
    )
        .into_response()
}

// ------------------------------------------------------------
// GET /daily-news
// ------------------------------------------------------------

async fn daily_news(State(state): State<AppState>) -> Response {
    let Some(record) = state.cache.read_daily() else {
        return error_response(
            StatusCode::NOT_FOUND,
            "No daily news available. Server may still be initializing.",
        );
    };

    if !record.is_current() {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!(
                "Daily news cache is outdated (from {}). It will refresh on the \
                 next daily run.",
                record.date
            ),
        );
    }

    Json(record).into_response()
}

// ------------------------------------------------------------
// GET / , /health , /examples
// ------------------------------------------------------------

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Multi-Perspective News Analysis API",
        "status": "running",
        "endpoints": {
            "POST /analyze": "Analyze news from multiple perspectives",
            "POST /search": "Search current headlines for a topic (cached daily)",
            "GET /daily-news": "Top global news headlines with analyses (cached daily)",
            "GET /health": "Health check"
        }
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    agent_initialized: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        agent_initialized: state.agent.is_some(),
    })
}

async fn examples() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "examples": [
            {
                "location": "United States",
                "topic": null,
                "description": "Find biggest current US news"
            },
            {
                "location": "California",
                "topic": "housing crisis",
                "description": "Analyze California housing crisis perspectives"
            },
            {
                "location": "New York City",
                "topic": "subway safety",
                "description": "NYC subway safety from multiple angles"
            },
            {
                "location": "United Kingdom",
                "topic": "NHS funding",
                "description": "UK healthcare funding perspectives"
            }
        ]
    }))
}
