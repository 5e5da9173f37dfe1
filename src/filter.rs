use crate::results::LinkCandidate;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// File extensions that mark a link as an HTML page
const HTML_EXTENSIONS: &[&str] = &[".html", ".htm"];

/// Decides which discovered links are eligible for following
#[derive(Debug, Default)]
pub struct LinkFilter {
    exclude_regexes: Vec<Regex>,
}

impl LinkFilter {
    /// Create a new link filter; `exclude_patterns` are matched against the full URL
    pub fn new(exclude_patterns: &[String]) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(exclude_patterns.len());
        for pattern in exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }
        Ok(Self { exclude_regexes })
    }

    /// Resolve every raw href against the URL of the page it came from
    pub fn discover(page_url: &Url, hrefs: &[String]) -> Vec<LinkCandidate> {
        hrefs
            .iter()
            .map(|href| LinkCandidate::resolve(page_url, href))
            .collect()
    }

    /// Static-mode policy: keep links whose path ends in `.html`/`.htm`.
    ///
    /// Query string and fragment play no part in the decision.
    pub fn heuristic_links(&self, candidates: &[LinkCandidate]) -> Vec<Url> {
        self.keep(candidates, |url| is_html_link(url))
    }

    /// Dynamic-mode pre-filter: links offered to the relevance selector
    pub fn relevance_candidates(&self, candidates: &[LinkCandidate]) -> Vec<Url> {
        self.keep(candidates, |url| is_html_link(url) || url.path().ends_with('/'))
    }

    fn keep(&self, candidates: &[LinkCandidate], rule: impl Fn(&Url) -> bool) -> Vec<Url> {
        let mut seen = HashSet::new();
        candidates
            .iter()
            .filter_map(|candidate| match &candidate.resolved_url {
                Some(url) => Some(url),
                None => {
                    ::log::debug!("Dropping unresolvable link: {}", candidate.raw_href);
                    None
                }
            })
            .filter(|url| is_web_url(url) && rule(url) && !self.is_excluded(url))
            .map(strip_fragment)
            .filter(|url| seen.insert(url.as_str().to_string()))
            .collect()
    }

    /// Check a URL against the configured exclude patterns
    pub fn is_excluded(&self, url: &Url) -> bool {
        let url_str = url.as_str();
        self.exclude_regexes.iter().any(|regex| regex.is_match(url_str))
    }
}

/// True when the scheme is `http` or `https`
pub fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// True when the URL path ends in an HTML file extension (case-insensitive)
pub fn is_html_link(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    HTML_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Drop the fragment, which never changes the fetched document
pub fn strip_fragment(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}
