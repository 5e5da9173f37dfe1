// Re-export modules
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod index;
pub mod llm;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod selector;
pub mod synth;

// Re-export commonly used types for convenience
pub use config::{FetchMode, PipelineConfig};
pub use error::{FetchError, PipelineError, SynthesisError};
pub use parsers::normalize;
pub use pipeline::{Pipeline, PipelineBuilder, run_pipeline};
pub use results::{AnswerResult, CrawlRequest, PageDocument};
