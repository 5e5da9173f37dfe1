pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

use crate::results::RawPage;

/// Enum to represent the content formats the normalizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserType {
    /// HTML document, rendered or served
    Html,
    /// Plain text, no markup and no links
    Text,
}

impl ParserType {
    /// Determines the parser type from the fetched page's content type and URL.
    ///
    /// A page labelled as text whose body holds HTML elements is still
    /// parsed as HTML.
    pub fn for_page(page: &RawPage) -> Self {
        let path = url::Url::parse(&page.url)
            .map(|u| u.path().to_ascii_lowercase())
            .unwrap_or_else(|_| page.url.to_ascii_lowercase());
        if !page.is_plain_text() && !path.ends_with(".txt") {
            return ParserType::Html;
        }
        if html::has_markup(&page.body) {
            ::log::debug!("Labelled as text but contains markup: {}", page.url);
            ParserType::Html
        } else {
            ::log::debug!("Classifying as Text: {}", page.url);
            ParserType::Text
        }
    }

    /// Returns if the parser should extract links
    pub fn should_extract_links(&self) -> bool {
        matches!(self, ParserType::Html)
    }
}

/// Result of parsing content
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Normalized plain text
    pub content: String,
    /// Raw `href` values in document order (HTML only)
    pub links: Vec<String>,
}

impl ParseResult {
    pub fn new(content: String, links: Vec<String>) -> Self {
        Self { content, links }
    }

    pub fn content_only(content: String) -> Self {
        Self {
            content,
            links: Vec::new(),
        }
    }
}

/// Options used for every page text that enters the corpus
pub fn page_text_options() -> text::TextParserOptions {
    text::TextParserOptions {
        preserve_paragraphs: true,
        preserve_line_breaks: false,
    }
}

/// Main parser that delegates to specific format parsers
pub struct Parser;

impl Parser {
    /// Parse content based on the parser type
    pub fn parse(content: &str, parser_type: ParserType) -> ParseResult {
        match parser_type {
            ParserType::Html => html::parse(content),
            ParserType::Text => text::parse_with_options(content, &page_text_options()),
        }
    }

    /// Determine parser type from the fetched page and then parse its body
    pub fn parse_page(page: &RawPage) -> ParseResult {
        Self::parse(&page.body, ParserType::for_page(page))
    }
}

/// Convert raw HTML into readable plain text.
///
/// Scripts, styles and markup are dropped, entities decoded, and block
/// elements become paragraphs separated by a blank line. Running it again on
/// its own output yields the same text.
pub fn normalize(raw_content: &str) -> String {
    if html::is_normalized_text(raw_content) {
        return raw_content.to_string();
    }
    html::parse_text_only(raw_content).content
}
