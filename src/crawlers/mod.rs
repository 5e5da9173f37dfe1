pub mod crawler;
pub mod http;
pub mod orchestrator;
pub mod web;

pub use crawler::{PageSession, SessionGuard, SessionOpener};
pub use http::HttpOpener;
pub use orchestrator::{CrawlOrchestrator, CrawlOutcome, CrawlState, RunState};
pub use web::BrowserOpener;
