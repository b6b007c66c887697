// src/config/agent.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_turns() -> usize {
    8
}
fn default_max_search_results() -> u32 {
    10
}
fn default_fallback_location() -> String {
    "United States".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub enabled: bool,
    /// Chat-completions model id.
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY.
    pub llm_api_key: String,
    /// "ENV" means: read from TAVILY_API_KEY.
    pub search_api_key: String,
    /// Iteration bound for the research loop.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Results per search call; capped at 10.
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,
    /// Fixed substitute location for the one-shot retry.
    #[serde(default = "default_fallback_location")]
    pub fallback_location: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            llm_api_key: String::new(),
            search_api_key: String::new(),
            max_turns: default_max_turns(),
            max_search_results: default_max_search_results(),
            fallback_location: default_fallback_location(),
        }
    }
}

impl AgentConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: AgentConfig = serde_json::from_str(&data)?;
        cfg.resolve_env_keys();
        cfg.sanitize();
        Ok(cfg)
    }

    /// Config with no file on disk: defaults plus keys from the environment.
    /// Missing keys stay empty; the caller decides whether that disables
    /// the agent or is acceptable (e.g. in tests with injected stubs).
    pub fn from_env() -> Self {
        let mut cfg = Self {
            llm_api_key: "ENV".to_string(),
            search_api_key: "ENV".to_string(),
            ..Self::default()
        };
        cfg.resolve_env_keys();
        cfg.sanitize();
        cfg
    }

    fn resolve_env_keys(&mut self) {
        if self.llm_api_key.trim().eq_ignore_ascii_case("env") {
            self.llm_api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        }
        if self.search_api_key.trim().eq_ignore_ascii_case("env") {
            self.search_api_key = env::var("TAVILY_API_KEY").unwrap_or_default();
        }
    }

    fn sanitize(&mut self) {
        if self.max_turns == 0 {
            self.max_turns = default_max_turns();
        }
        self.max_search_results = self.max_search_results.clamp(1, 10);
        if self.fallback_location.trim().is_empty() {
            self.fallback_location = default_fallback_location();
        }
    }

    /// True when both upstream credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.llm_api_key.trim().is_empty() && !self.search_api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_indirection_resolves_keys() {
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("TAVILY_API_KEY", "tvly-test");
        let cfg = AgentConfig::from_env();
        assert_eq!(cfg.llm_api_key, "sk-test");
        assert_eq!(cfg.search_api_key, "tvly-test");
        assert!(cfg.has_credentials());
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("TAVILY_API_KEY");
    }

    #[test]
    #[serial]
    fn missing_keys_do_not_panic() {
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("TAVILY_API_KEY");
        let cfg = AgentConfig::from_env();
        assert!(!cfg.has_credentials());
    }

    #[test]
    fn sanitize_clamps_limits() {
        let mut cfg = AgentConfig {
            max_turns: 0,
            max_search_results: 50,
            fallback_location: "  ".into(),
            ..AgentConfig::default()
        };
        cfg.sanitize();
        assert_eq!(cfg.max_turns, 8);
        assert_eq!(cfg.max_search_results, 10);
        assert_eq!(cfg.fallback_location, "United States");
    }
}
