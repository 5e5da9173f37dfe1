use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How pages are acquired, which also decides how links are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP GET, follow every linked `.html`/`.htm` page
    #[default]
    Static,
    /// Headless browser via WebDriver, follow only model-selected links
    Dynamic,
}

/// Configuration for the language-model and embedding provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Gemini REST API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used for link relevance and answer generation
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used to embed passages and instructions
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// API key; `GOOGLE_API_KEY` overrides this when set
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout for model calls, in seconds
    #[serde(default = "default_model_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Configuration for passage retrieval
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages handed to the model
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Target passage length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between neighbouring passages
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Configuration for one pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Static HTTP or browser-rendered acquisition
    #[serde(default)]
    pub mode: FetchMode,

    /// URL for the WebDriver instance (dynamic mode)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Upper bound on follow-up links fetched after the root page
    #[serde(default = "default_max_follow_links")]
    pub max_follow_links: usize,

    /// Timeout for one static fetch, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Timeout for one browser navigation including the idle wait, in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Quiet window with no new network requests that counts as idle, in milliseconds
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Budget for the whole run, crawl and synthesis, in seconds
    #[serde(default = "default_total_timeout_secs")]
    pub total_timeout_secs: u64,

    /// User agent for static fetches
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Regex patterns for links never to follow
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl PipelineConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply `WEBDRIVER_URL` and `GOOGLE_API_KEY` when they are set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(webdriver_url) = non_empty_env("WEBDRIVER_URL") {
            self.webdriver_url = webdriver_url;
        }
        if let Some(api_key) = non_empty_env("GOOGLE_API_KEY") {
            self.model.api_key = Some(api_key);
        }
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_secs == 0
            || self.navigation_timeout_secs == 0
            || self.total_timeout_secs == 0
        {
            return Err(ConfigError::invalid("timeouts must be greater than zero"));
        }
        if self.model.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "model.request_timeout_secs must be greater than zero",
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::invalid("retrieval.top_k must be at least 1"));
        }
        if self.retrieval.chunk_size == 0 {
            return Err(ConfigError::invalid("retrieval.chunk_size must be at least 1"));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ConfigError::invalid(
                "retrieval.chunk_overlap must be smaller than retrieval.chunk_size",
            ));
        }
        for pattern in &self.exclude_patterns {
            regex::Regex::new(pattern)
                .map_err(|e| ConfigError::invalid(format!("bad exclude pattern {pattern}: {e}")))?;
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}

impl ModelConfig {
    /// The API key, or an error naming the variable to set
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::invalid("no API key; set GOOGLE_API_KEY"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_max_follow_links() -> usize {
    20
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_navigation_timeout_secs() -> u64 {
    45
}

fn default_idle_timeout_ms() -> u64 {
    500
}

fn default_total_timeout_secs() -> u64 {
    300
}

fn default_user_agent() -> String {
    concat!("site-distill/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_chat_model() -> String {
    "gemini-pro".to_string()
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

fn default_model_timeout_secs() -> u64 {
    60
}

fn default_top_k() -> usize {
    4
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            api_key: None,
            request_timeout_secs: default_model_timeout_secs(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            max_follow_links: default_max_follow_links(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            idle_timeout_ms: default_idle_timeout_ms(),
            total_timeout_secs: default_total_timeout_secs(),
            user_agent: default_user_agent(),
            exclude_patterns: Vec::new(),
            model: ModelConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values for the given mode
    pub fn new(mode: FetchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config.mode, FetchMode::Static);
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.max_follow_links, 20);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.model.chat_model, "gemini-pro");
        assert_eq!(config.model.embedding_model, "models/embedding-001");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "mode": "dynamic",
            "max_follow_links": 3,
            "retrieval": { "top_k": 2 },
            "model": { "api_key": "k" }
        }"#;
        let config = PipelineConfig::from_json(json).unwrap();
        assert_eq!(config.mode, FetchMode::Dynamic);
        assert_eq!(config.max_follow_links, 3);
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert_eq!(config.model.require_api_key().unwrap(), "k");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.total_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.exclude_patterns = vec!["(".to_string()];
        assert!(config.validate().is_err());

        let config = PipelineConfig::from_json(r#"{ "model": { "request_timeout_secs": 0 } }"#)
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_key() {
        let config = ModelConfig::default();
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = PipelineConfig::default();
        config.model.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
