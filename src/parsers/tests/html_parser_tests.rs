use crate::parsers::{Parser, ParserType, html, normalize};
use crate::results::RawPage;

#[test]
fn test_text_and_links() {
    let html_content = "<html><body><p>Hello, world!</p><a href=\"https://example.com\">Link</a></body></html>";
    let result = Parser::parse(html_content, ParserType::Html);
    assert_eq!(result.content, "Hello, world!\n\nLink");
    assert_eq!(result.links, vec!["https://example.com"]);
}

#[test]
fn test_scripts_and_styles_are_stripped() {
    let html_content = r#"<html>
        <head><title>Ignored</title><style>body { color: red; }</style></head>
        <body>
            <script>var secret = 1;</script>
            <noscript>Enable JS</noscript>
            <p>Visible text</p>
        </body></html>"#;
    let text = normalize(html_content);
    assert_eq!(text, "Visible text");
}

#[test]
fn test_entities_are_decoded() {
    let text = normalize("<p>Fish &amp; Chips &lt;3 &eacute;t&eacute;</p>");
    assert_eq!(text, "Fish & Chips <3 été");
}

#[test]
fn test_paragraph_structure() {
    let html_content = r#"<body>
        <h1>News</h1>
        <ul><li>First <b>headline</b></li><li>Second headline</li></ul>
        <div>Footer <span>text</span></div>
    </body>"#;
    let text = normalize(html_content);
    assert_eq!(
        text,
        "News\n\nFirst headline\n\nSecond headline\n\nFooter text"
    );
}

#[test]
fn test_malformed_html_degrades_gracefully() {
    let text = normalize("<div><p>Unclosed paragraph<div>Nested <b>bold</div>");
    assert!(text.contains("Unclosed paragraph"));
    assert!(text.contains("Nested bold"));
}

#[test]
fn test_normalize_is_idempotent() {
    let html_content = r#"<html><body>
        <h2>Title</h2><p>Some    spaced
        text.</p><table><tr><td>a</td><td>b</td></tr></table>
    </body></html>"#;
    let once = normalize(html_content);
    let twice = normalize(&once);
    assert_eq!(once, "Title\n\nSome spaced text.\n\na b");
    assert_eq!(once, twice);
}

#[test]
fn test_links_keep_document_order() {
    let html_content = r#"<a href="b.html">B</a><p><a href="/a.htm">A</a></p><a>no href</a>"#;
    assert_eq!(html::parse(html_content).links, vec!["b.html", "/a.htm"]);
}

#[test]
fn test_escaped_tags_survive_a_second_pass() {
    let once = normalize("<p>Wrap it in &lt;b&gt;bold&lt;/b&gt; tags</p>");
    assert_eq!(once, "Wrap it in <b>bold</b> tags");
    assert_eq!(normalize(&once), once);
}

#[test]
fn test_escaped_entities_survive_a_second_pass() {
    let once = normalize("<p>Write &amp;amp; in HTML</p>");
    assert_eq!(once, "Write &amp; in HTML");
    assert_eq!(normalize(&once), once);
}

#[test]
fn test_single_line_markup_is_still_stripped() {
    assert_eq!(normalize("<p>One <b>line</b></p>"), "One line");
    assert_eq!(normalize("<title>T</title>Body"), "Body");
}

#[test]
fn test_markup_detection() {
    assert!(!html::has_markup("plain words, 3 < 4 & 5 > 2"));
    assert!(html::has_markup("<div>x</div>"));
    assert!(html::is_normalized_text("First\n\nSecond <i>part</i>"));
    assert!(!html::is_normalized_text("First\nSecond"));
    assert!(!html::is_normalized_text("<ul><li>x</li></ul>"));
}

#[test]
fn test_text_only_has_no_links() {
    let result = html::parse_text_only(r#"<a href="x.html">X</a>"#);
    assert_eq!(result.content, "X");
    assert!(result.links.is_empty());
}

#[test]
fn test_parser_type_for_page() {
    let page = RawPage::html("https://example.org/page", "<p>x</p>");
    assert_eq!(ParserType::for_page(&page), ParserType::Html);

    let page = RawPage::html("https://example.org/notes.TXT?v=1", "x");
    assert_eq!(ParserType::for_page(&page), ParserType::Text);

    let mut page = RawPage::html("https://example.org/raw", "a\n\nb");
    page.content_type = Some("text/plain".to_string());
    assert_eq!(ParserType::for_page(&page), ParserType::Text);
    assert!(!ParserType::Text.should_extract_links());

    let result = Parser::parse_page(&page);
    assert_eq!(result.content, "a\n\nb");
    assert!(result.links.is_empty());
}

#[test]
fn test_html_labelled_as_text_is_parsed_as_html() {
    let mut page = RawPage::html(
        "https://example.org/raw",
        r#"<html><body><h1>Title</h1><a href="next.html">Next</a></body></html>"#,
    );
    page.content_type = Some("text/plain".to_string());
    assert_eq!(ParserType::for_page(&page), ParserType::Html);

    let result = Parser::parse_page(&page);
    assert_eq!(result.content, "Title\n\nNext");
    assert_eq!(result.links, vec!["next.html"]);
}
