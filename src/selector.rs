use crate::filter::{LinkFilter, strip_fragment};
use crate::llm::LanguageModel;
use crate::results::LinkCandidate;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Literal the model returns when no link is relevant
pub const NONE_MARKER: &str = "empty";

/// Picks follow-up links from a page's candidates
#[async_trait]
pub trait LinkSelector: Send + Sync {
    async fn select(
        &self,
        page_url: &Url,
        candidates: &[LinkCandidate],
        instruction: &str,
    ) -> Vec<Url>;
}

/// Follows every link whose path ends in `.html`/`.htm`
pub struct HeuristicSelector {
    filter: LinkFilter,
}

impl HeuristicSelector {
    pub fn new(filter: LinkFilter) -> Self {
        Self { filter }
    }
}

#[async_trait]
impl LinkSelector for HeuristicSelector {
    async fn select(&self, page_url: &Url, candidates: &[LinkCandidate], _: &str) -> Vec<Url> {
        let links = self.filter.heuristic_links(candidates);
        ::log::info!(
            "Heuristic policy kept {} of {} links on {}",
            links.len(),
            candidates.len(),
            page_url
        );
        links
    }
}

/// Asks a language model which links matter for the instruction
pub struct RelevanceSelector {
    filter: LinkFilter,
    model: Arc<dyn LanguageModel>,
}

impl RelevanceSelector {
    pub fn new(filter: LinkFilter, model: Arc<dyn LanguageModel>) -> Self {
        Self { filter, model }
    }
}

/// Prompt asking for a comma-separated subset of `links`
pub fn relevance_prompt(links: &[Url], instruction: &str) -> String {
    let list = links
        .iter()
        .map(Url::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are given the links found on a web page and an instruction.\n\
         Return only the links relevant to the instruction as a comma-separated list, \
         copied exactly as given. If no link is relevant, return the single word {NONE_MARKER}.\n\n\
         Links: {list}\n\n\
         Instruction: {instruction}"
    )
}

/// Split a model reply into link strings.
///
/// Reading stops at the first none-marker; blank entries are ignored.
pub fn parse_selection(response: &str) -> Vec<String> {
    let mut links = Vec::new();
    for item in response.split(',') {
        let item = item
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '<' || c == '>')
            .trim();
        if item.is_empty() {
            continue;
        }
        if item.eq_ignore_ascii_case(NONE_MARKER) {
            break;
        }
        links.push(item.to_string());
    }
    links
}

#[async_trait]
impl LinkSelector for RelevanceSelector {
    async fn select(
        &self,
        page_url: &Url,
        candidates: &[LinkCandidate],
        instruction: &str,
    ) -> Vec<Url> {
        let offered = self.filter.relevance_candidates(candidates);
        if offered.is_empty() {
            ::log::info!("No followable links on {}, skipping relevance check", page_url);
            return Vec::new();
        }

        let prompt = relevance_prompt(&offered, instruction);
        let response = match self.model.invoke(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                ::log::warn!("Relevance selection failed for {}: {}", page_url, e);
                return Vec::new();
            }
        };

        let known: HashSet<&str> = offered.iter().map(Url::as_str).collect();
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for raw in parse_selection(&response) {
            let url = match page_url.join(&raw) {
                Ok(url) => strip_fragment(&url),
                Err(e) => {
                    ::log::warn!("Model returned an unparsable link {:?}: {}", raw, e);
                    continue;
                }
            };
            if !known.contains(url.as_str()) {
                ::log::warn!("Model returned a link not on the page: {}", url);
                continue;
            }
            if seen.insert(url.to_string()) {
                selected.push(url);
            }
        }

        ::log::info!(
            "Relevance selector chose {} of {} links on {}",
            selected.len(),
            offered.len(),
            page_url
        );
        selected
    }
}
