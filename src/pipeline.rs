use crate::config::{FetchMode, PipelineConfig};
use crate::crawlers::{BrowserOpener, CrawlOrchestrator, CrawlState, HttpOpener, SessionOpener};
use crate::error::{ConfigError, PipelineError};
use crate::filter::{LinkFilter, is_web_url};
use crate::llm::{Embedder, GeminiClient, LanguageModel};
use crate::results::{AnswerResult, CrawlRequest};
use crate::selector::{HeuristicSelector, LinkSelector, RelevanceSelector};
use crate::synth::Synthesizer;
use std::sync::Arc;
use url::Url;

/// Builder for a [`Pipeline`].
///
/// Capabilities that are not injected are built from the configuration:
/// Gemini for the model and embeddings, HTTP or WebDriver for pages.
pub struct PipelineBuilder {
    config: PipelineConfig,
    model: Option<Arc<dyn LanguageModel>>,
    embedder: Option<Arc<dyn Embedder>>,
    opener: Option<Arc<dyn SessionOpener>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            model: None,
            embedder: None,
            opener: None,
        }
    }

    /// Set the fetch mode
    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Override the follow-up link limit
    pub fn with_max_follow_links(mut self, value: usize) -> Self {
        self.config.max_follow_links = value;
        self
    }

    /// Override the total run budget
    pub fn with_total_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.total_timeout_secs = timeout_seconds;
        self
    }

    pub fn with_language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_session_opener(mut self, opener: Arc<dyn SessionOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let config = self.config;
        config.validate()?;

        let (model, embedder) = match (self.model, self.embedder) {
            (Some(model), Some(embedder)) => (model, embedder),
            (model, embedder) => {
                let gemini = Arc::new(GeminiClient::from_config(&config.model)?);
                let default_model: Arc<dyn LanguageModel> = gemini.clone();
                let default_embedder: Arc<dyn Embedder> = gemini;
                (
                    model.unwrap_or(default_model),
                    embedder.unwrap_or(default_embedder),
                )
            }
        };

        let opener: Arc<dyn SessionOpener> = match self.opener {
            Some(opener) => opener,
            None => match config.mode {
                FetchMode::Static => Arc::new(HttpOpener::new(&config)?),
                FetchMode::Dynamic => Arc::new(BrowserOpener::new(&config)),
            },
        };

        let filter = LinkFilter::new(&config.exclude_patterns)
            .map_err(|e| ConfigError::invalid(e.to_string()))?;
        let selector: Arc<dyn LinkSelector> = match config.mode {
            FetchMode::Static => Arc::new(HeuristicSelector::new(filter)),
            FetchMode::Dynamic => Arc::new(RelevanceSelector::new(filter, model.clone())),
        };

        ::log::debug!("Pipeline built in {:?} mode", config.mode);
        Ok(Pipeline {
            orchestrator: CrawlOrchestrator::new(opener, selector, config.max_follow_links),
            synthesizer: Synthesizer::new(embedder, model, config.retrieval),
            config,
        })
    }
}

/// The crawl-and-extract pipeline.
///
/// Holds no per-run state; concurrent `run` calls each get their own
/// session, corpus and index.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    orchestrator: CrawlOrchestrator,
    synthesizer: Synthesizer,
}

impl Pipeline {
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Crawl, then answer the instruction from what was fetched
    pub async fn run(&self, request: &CrawlRequest) -> Result<AnswerResult, PipelineError> {
        let start_url = Url::parse(request.start_url.trim())
            .map_err(|e| PipelineError::invalid_request(format!("bad start URL: {e}")))?;
        if !is_web_url(&start_url) {
            return Err(PipelineError::invalid_request(format!(
                "start URL must be http or https: {start_url}"
            )));
        }
        if request.instruction.trim().is_empty() {
            return Err(PipelineError::invalid_request("instruction is empty"));
        }

        ::log::info!("Starting {:?} crawl for: {}", self.config.mode, start_url);
        let budget = self.config.total_timeout();
        match tokio::time::timeout(budget, self.run_inner(&start_url, &request.instruction)).await
        {
            Ok(result) => result,
            Err(_) => {
                ::log::error!("Run for {} exceeded {:?}", start_url, budget);
                Err(PipelineError::Timeout {
                    secs: self.config.total_timeout_secs,
                })
            }
        }
    }

    async fn run_inner(
        &self,
        start_url: &Url,
        instruction: &str,
    ) -> Result<AnswerResult, PipelineError> {
        let outcome = self.orchestrator.crawl(start_url, instruction).await;
        let mut state = outcome.state;

        if outcome.corpus.is_empty() {
            return Err(PipelineError::NoContent {
                url: start_url.to_string(),
            });
        }
        if !outcome.corpus.has_text() {
            ::log::warn!("Pages from {} have no visible text", start_url);
            state.advance(CrawlState::Aborted);
            return Err(PipelineError::NoContent {
                url: start_url.to_string(),
            });
        }

        state.advance(CrawlState::Synthesizing);
        match self.synthesizer.synthesize(&outcome.corpus, instruction).await {
            Ok(answer) => {
                state.advance(CrawlState::Done);
                Ok(answer)
            }
            Err(e) => {
                ::log::error!("Error during LLM processing: {}", e);
                state.advance(CrawlState::Aborted);
                Err(PipelineError::Synthesis(e))
            }
        }
    }
}

/// Build a pipeline from `config` with default capabilities and run one request
pub async fn run_pipeline(
    config: PipelineConfig,
    start_url: &str,
    instruction: &str,
) -> Result<AnswerResult, Box<dyn std::error::Error + Send + Sync>> {
    let pipeline = Pipeline::builder(config).build()?;
    let answer = pipeline
        .run(&CrawlRequest::new(start_url, instruction))
        .await?;
    Ok(answer)
}
