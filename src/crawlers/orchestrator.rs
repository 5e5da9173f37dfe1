use crate::crawlers::crawler::{SessionGuard, SessionOpener};
use crate::filter::{LinkFilter, strip_fragment};
use crate::parsers::{Parser, ParserType};
use crate::results::{Corpus, PageDocument, RawPage};
use crate::selector::LinkSelector;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// States of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Start,
    FetchingRoot,
    Discovering,
    FollowingLinks,
    Synthesizing,
    Done,
    Aborted,
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlState::Start => "start",
            CrawlState::FetchingRoot => "fetching-root",
            CrawlState::Discovering => "discovering",
            CrawlState::FollowingLinks => "following-links",
            CrawlState::Synthesizing => "synthesizing",
            CrawlState::Done => "done",
            CrawlState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

impl CrawlState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: CrawlState) -> bool {
        use CrawlState::*;
        matches!(
            (self, next),
            (Start, FetchingRoot)
                | (FetchingRoot, Discovering)
                | (FetchingRoot, Aborted)
                | (Discovering, FollowingLinks)
                | (FollowingLinks, Synthesizing)
                | (FollowingLinks, Done)
                | (FollowingLinks, Aborted)
                | (Synthesizing, Done)
                | (Synthesizing, Aborted)
        )
    }
}

/// Current state of one run, with logged transitions
#[derive(Debug)]
pub struct RunState {
    state: CrawlState,
    run_url: String,
}

impl RunState {
    pub fn new(run_url: impl Into<String>) -> Self {
        Self {
            state: CrawlState::Start,
            run_url: run_url.into(),
        }
    }

    pub fn current(&self) -> CrawlState {
        self.state
    }

    pub fn advance(&mut self, next: CrawlState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        ::log::debug!("[{}] {} -> {}", self.run_url, self.state, next);
        self.state = next;
    }
}

/// Result of the crawl phase of a run
#[derive(Debug)]
pub struct CrawlOutcome {
    pub corpus: Corpus,
    pub state: RunState,
}

/// Sequential crawler: one session, root first, then selected links in order
#[derive(Clone)]
pub struct CrawlOrchestrator {
    opener: Arc<dyn SessionOpener>,
    selector: Arc<dyn LinkSelector>,
    max_follow_links: usize,
}

impl CrawlOrchestrator {
    pub fn new(
        opener: Arc<dyn SessionOpener>,
        selector: Arc<dyn LinkSelector>,
        max_follow_links: usize,
    ) -> Self {
        Self {
            opener,
            selector,
            max_follow_links,
        }
    }

    /// Crawl from `start_url`.
    ///
    /// A failure on the root page ends in `Aborted` with an empty corpus;
    /// failures on follow-up links are logged and skipped. The session is
    /// closed before returning, and also when this future is dropped.
    pub async fn crawl(&self, start_url: &Url, instruction: &str) -> CrawlOutcome {
        let mut state = RunState::new(start_url.as_str());
        state.advance(CrawlState::FetchingRoot);

        let session = match self.opener.open().await {
            Ok(session) => session,
            Err(e) => {
                ::log::error!("Failed to open page session: {}", e);
                state.advance(CrawlState::Aborted);
                return CrawlOutcome {
                    corpus: Corpus::default(),
                    state,
                };
            }
        };
        let mut guard = SessionGuard::new(session);

        let root = match guard.fetch(start_url).await {
            Ok(page) => page,
            Err(e) => {
                ::log::error!("Failed to navigate to start URL: {}", e);
                guard.close().await;
                state.advance(CrawlState::Aborted);
                return CrawlOutcome {
                    corpus: Corpus::default(),
                    state,
                };
            }
        };

        state.advance(CrawlState::Discovering);
        let base_url = served_url(&root, start_url);
        let (root_doc, hrefs) = to_document(&root);
        let mut documents = vec![root_doc];

        let follow = if hrefs.is_empty() {
            ::log::info!("No links found on {}", base_url);
            Vec::new()
        } else {
            let candidates = LinkFilter::discover(&base_url, &hrefs);
            let selected = self
                .selector
                .select(&base_url, &candidates, instruction)
                .await;
            self.bound_links(&[start_url, &base_url], selected)
        };

        state.advance(CrawlState::FollowingLinks);
        for link in follow {
            match guard.fetch(&link).await {
                Ok(page) => {
                    let (doc, _) = to_document(&page);
                    documents.push(doc);
                }
                Err(e) => {
                    ::log::warn!("Skipping link {} due to error: {}", link, e);
                }
            }
        }

        guard.close().await;
        ::log::info!(
            "Crawl of {} finished with {} documents",
            start_url,
            documents.len()
        );
        CrawlOutcome {
            corpus: Corpus::new(documents),
            state,
        }
    }

    /// Drop the root itself and repeats, then apply the follow-up limit
    fn bound_links(&self, root_urls: &[&Url], selected: Vec<Url>) -> Vec<Url> {
        let mut seen = HashSet::new();
        for root in root_urls {
            seen.insert(strip_fragment(root).to_string());
        }

        let mut links: Vec<Url> = selected
            .into_iter()
            .filter(|url| seen.insert(strip_fragment(url).to_string()))
            .collect();

        if links.len() > self.max_follow_links {
            ::log::info!(
                "Following {} of {} selected links (max_follow_links)",
                self.max_follow_links,
                links.len()
            );
            links.truncate(self.max_follow_links);
        }
        links
    }
}

/// URL the page was served from after redirects, or the requested one
fn served_url(page: &RawPage, requested: &Url) -> Url {
    match Url::parse(&page.url) {
        Ok(url) => {
            if url != *requested {
                ::log::debug!("{} was served from {}", requested, url);
            }
            url
        }
        Err(_) => requested.clone(),
    }
}

/// Normalize a fetched page; also returns its raw hrefs when it has any
fn to_document(page: &RawPage) -> (PageDocument, Vec<String>) {
    let parser_type = ParserType::for_page(page);
    let parsed = Parser::parse_page(page);
    ::log::info!(
        "Fetched {} ({} chars of text)",
        page.url,
        parsed.content.len()
    );
    let links = if parser_type.should_extract_links() {
        parsed.links
    } else {
        Vec::new()
    };
    (PageDocument::new(page.url.as_str(), parsed.content), links)
}
