use crate::parsers::{ParseResult, page_text_options, text};
use scraper::{ElementRef, Html, Node};

/// Elements whose content never reaches the text output
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "object", "canvas",
];

/// Elements that start and end a paragraph
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tr",
    "ul",
];

/// Elements the HTML parser adds to any document, tags or not
const IMPLIED_ELEMENTS: &[&str] = &["html", "head", "body"];

/// Elements that change text layout besides the block elements
const LAYOUT_ELEMENTS: &[&str] = &["br", "td", "th", "tr", "title", "meta", "link", "base"];

/// Walk state: text with paragraph markers, plus anchors seen on the way
#[derive(Default)]
struct Collector {
    text: String,
    links: Vec<String>,
    collect_links: bool,
}

impl Collector {
    fn paragraph_break(&mut self) {
        self.text.push_str("\n\n");
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            return;
        }

        if self.collect_links && name == "a" {
            if let Some(href) = element.value().attr("href") {
                self.links.push(href.to_string());
            }
        }

        let is_block = BLOCK_ELEMENTS.contains(&name);
        if is_block {
            self.paragraph_break();
        }

        match name {
            "br" => self.text.push('\n'),
            "td" | "th" => self.text.push(' '),
            _ => {}
        }

        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text.push_str(text),
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.visit(child_element);
                    }
                }
                _ => {}
            }
        }

        if is_block {
            self.paragraph_break();
        }
    }
}

fn collect(html: &str, collect_links: bool) -> Collector {
    let doc = Html::parse_document(html);
    let mut collector = Collector {
        collect_links,
        ..Collector::default()
    };
    collector.visit(doc.root_element());
    collector
}

/// Parses HTML content to extract paragraph text and links
pub fn parse(html: &str) -> ParseResult {
    let collected = collect(html, true);
    let content = text::parse_with_options(&collected.text, &page_text_options()).content;

    ::log::debug!("HTML parser found {} links", collected.links.len());
    if !collected.links.is_empty() {
        ::log::debug!(
            "First few links: {:?}",
            collected.links.iter().take(5).collect::<Vec<_>>()
        );
    }

    ParseResult::new(content, collected.links)
}

/// Parses HTML content but only extracts text (no links)
pub fn parse_text_only(html: &str) -> ParseResult {
    let collected = collect(html, false);
    ParseResult::content_only(
        text::parse_with_options(&collected.text, &page_text_options()).content,
    )
}

/// Names of the elements in `content` that are not added by the parser itself
fn explicit_elements(content: &str) -> Vec<String> {
    let doc = Html::parse_document(content);
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .map(|element| element.value().name().to_string())
        .filter(|name| !IMPLIED_ELEMENTS.contains(&name.as_str()))
        .collect()
}

/// True when `content` contains at least one real HTML element
pub fn has_markup(content: &str) -> bool {
    !explicit_elements(content).is_empty()
}

/// True when `content` already reads as normalized page text.
///
/// It must be stable under the text normalizer and hold no element that
/// would change its layout. Inline tags and entities that appear literally
/// in page text are left alone.
pub fn is_normalized_text(content: &str) -> bool {
    if text::parse_with_options(content, &page_text_options()).content != content {
        return false;
    }
    explicit_elements(content).iter().all(|name| {
        let name = name.as_str();
        !BLOCK_ELEMENTS.contains(&name)
            && !SKIPPED_ELEMENTS.contains(&name)
            && !LAYOUT_ELEMENTS.contains(&name)
    })
}
