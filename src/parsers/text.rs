use crate::parsers::ParseResult;

/// Configuration options for text parsing
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParserOptions {
    /// Keep paragraphs apart with exactly one blank line
    pub preserve_paragraphs: bool,
    /// Keep single newlines inside a paragraph
    pub preserve_line_breaks: bool,
}

/// Parses text with specific options.
///
/// Lines are trimmed, runs of spaces collapse to one, and blank lines mark
/// paragraph boundaries.
pub fn parse_with_options(text: &str, options: &TextParserOptions) -> ParseResult {
    if text.trim().is_empty() {
        return ParseResult::content_only(String::new());
    }

    let paragraphs = split_into_paragraphs(text);
    let processed = paragraphs
        .iter()
        .map(|para| process_paragraph(para, options))
        .collect::<Vec<_>>();

    ParseResult::content_only(join_paragraphs(&processed, options))
}

/// Splits text into paragraphs of trimmed, non-empty lines
pub fn split_into_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

/// Collapses a paragraph's lines according to options
pub fn process_paragraph(paragraph: &[&str], options: &TextParserOptions) -> String {
    let lines = paragraph.iter().map(|line| collapse_whitespace(line));
    if options.preserve_line_breaks {
        lines.collect::<Vec<_>>().join("\n")
    } else {
        lines.collect::<Vec<_>>().join(" ")
    }
}

/// Joins processed paragraphs into a single string
pub fn join_paragraphs(paragraphs: &[String], options: &TextParserOptions) -> String {
    if options.preserve_paragraphs {
        paragraphs.join("\n\n")
    } else {
        paragraphs.join(" ")
    }
}

/// Normalizes whitespace within a single line or paragraph
pub fn collapse_whitespace(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}
