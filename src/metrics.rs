use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use shuttle_axum::axum::{routing::get, Router};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and describe the pipeline series.
    pub fn init() -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "analysis_attempts_total",
            "Full research+extraction pipeline attempts."
        );
        describe_counter!(
            "analysis_fallbacks_total",
            "Attempts retried with the default location."
        );
        describe_counter!(
            "research_search_calls_total",
            "Search invocations made inside research loops."
        );
        describe_counter!("topic_cache_hits_total", "Topic searches served from cache.");
        describe_counter!("topic_cache_misses_total", "Topic searches that hit the API.");
        describe_counter!(
            "digest_headline_failures_total",
            "Daily digest headlines whose analysis failed."
        );

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
