use serde::{Deserialize, Serialize};
use url::Url;

/// Separator placed between page texts when the corpus is assembled
pub const CORPUS_SEPARATOR: &str = "\n";

/// Input to one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// URL to start crawling from
    pub start_url: String,

    /// What the caller wants extracted from the site
    pub instruction: String,
}

impl CrawlRequest {
    pub fn new(start_url: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            instruction: instruction.into(),
        }
    }
}

/// Raw body of one fetched page
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL the content was served from, after any redirects
    pub url: String,

    /// Content type reported by the server, if any
    pub content_type: Option<String>,

    /// Page body: HTML, or the rendered DOM in dynamic mode
    pub body: String,
}

impl RawPage {
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
            body: body.into(),
        }
    }

    /// True when the server declared the body as plain text
    pub fn is_plain_text(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("text/plain"))
            .unwrap_or(false)
    }
}

/// Normalized text of one successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDocument {
    /// URL of the page
    pub url: String,

    /// Plain text extracted from the page
    pub text: String,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// A link found on a page, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// The `href` exactly as it appeared in the page
    pub raw_href: String,

    /// Absolute form, if the href could be resolved against the page URL
    pub resolved_url: Option<Url>,
}

impl LinkCandidate {
    /// Resolve `raw_href` against the URL of the page it was found on
    pub fn resolve(page_url: &Url, raw_href: &str) -> Self {
        let resolved_url = page_url.join(raw_href.trim()).ok();
        Self {
            raw_href: raw_href.to_string(),
            resolved_url,
        }
    }
}

/// Accumulated page texts of one run, in crawl order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<PageDocument>,
}

impl Corpus {
    pub fn new(documents: Vec<PageDocument>) -> Self {
        Self { documents }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when at least one document has visible text
    pub fn has_text(&self) -> bool {
        self.documents.iter().any(|doc| !doc.text.trim().is_empty())
    }

    pub fn documents(&self) -> &[PageDocument] {
        &self.documents
    }

    /// All page texts joined into a single logical document
    pub fn text(&self) -> String {
        self.documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join(CORPUS_SEPARATOR)
    }
}

/// Final answer of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub content: String,
}

impl AnswerResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_keeps_order() {
        let corpus = Corpus::new(vec![
            PageDocument::new("https://example.com/", "root"),
            PageDocument::new("https://example.com/a.html", "first"),
            PageDocument::new("https://example.com/b.html", "second"),
        ]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.text(), "root\nfirst\nsecond");
        assert!(corpus.has_text());

        let blank = Corpus::new(vec![PageDocument::new("https://example.com/", "  ")]);
        assert!(!blank.is_empty());
        assert!(!blank.has_text());
    }

    #[test]
    fn test_link_candidate_resolution() {
        let page = Url::parse("https://example.com/docs/index.html").unwrap();

        let relative = LinkCandidate::resolve(&page, "guide.html");
        assert_eq!(
            relative.resolved_url.unwrap().as_str(),
            "https://example.com/docs/guide.html"
        );

        let rooted = LinkCandidate::resolve(&page, "/about/");
        assert_eq!(
            rooted.resolved_url.unwrap().as_str(),
            "https://example.com/about/"
        );

        let absolute = LinkCandidate::resolve(&page, "https://other.org/x.htm");
        assert_eq!(absolute.raw_href, "https://other.org/x.htm");
        assert_eq!(
            absolute.resolved_url.unwrap().as_str(),
            "https://other.org/x.htm"
        );
    }

    #[test]
    fn test_plain_text_detection() {
        let mut page = RawPage::html("https://example.com/notes.txt", "hello");
        assert!(!page.is_plain_text());
        page.content_type = Some("text/plain; charset=utf-8".to_string());
        assert!(page.is_plain_text());
    }
}
