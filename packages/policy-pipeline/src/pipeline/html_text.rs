//! Rendered HTML to plain text.
//!
//! Boilerplate elements are skipped, the main content area is preferred over
//! the whole body, whitespace is collapsed and the result is truncated on a
//! char boundary.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text never reaches the prompt.
pub const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "iframe", "template",
    "svg",
];

/// Main-content selectors, in priority order.
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    ".content",
    ".main-content",
    "#content",
    "#main",
    ".policy-content",
    ".legal-content",
];

/// Elements that separate words even without surrounding whitespace.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table", "td",
    "th", "tr", "ul",
];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static BODY: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("body").ok());

/// Extract readable text from an HTML document.
///
/// Returns at most `max_chars` characters; empty if the page has no text.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut text = content_root(&document)
        .map(element_text)
        .unwrap_or_default();

    // A main region can be an empty shell filled in elsewhere
    if text.is_empty() {
        text = body(&document).map(element_text).unwrap_or_default();
    }

    truncate_chars(&text, max_chars).to_string()
}

/// First element matching the content selectors (in priority order), else
/// `<body>`.
fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT
        .iter()
        .find_map(|selector| document.select(selector).find(|el| !inside_stripped(*el)))
        .or_else(|| body(document))
}

fn body(document: &Html) -> Option<ElementRef<'_>> {
    BODY.as_ref()
        .and_then(|selector| document.select(selector).next())
}

fn inside_stripped(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| STRIPPED_TAGS.contains(&a.value().name()))
}

enum Step<N> {
    Visit(N),
    Break,
}

/// Collapsed text of `root`, skipping stripped subtrees.
fn element_text(root: ElementRef<'_>) -> String {
    let mut raw = String::new();
    let mut stack = vec![Step::Visit(*root)];

    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Visit(node) => node,
            Step::Break => {
                raw.push(' ');
                continue;
            }
        };

        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(element) => {
                let name = element.name();
                if STRIPPED_TAGS.contains(&name) {
                    continue;
                }
                if BLOCK_TAGS.contains(&name) {
                    raw.push(' ');
                    stack.push(Step::Break);
                }
                let children: Vec<_> = node.children().collect();
                stack.extend(children.into_iter().rev().map(Step::Visit));
            }
            _ => {}
        }
    }

    WHITESPACE.replace_all(&raw, " ").trim().to_string()
}

/// Longest prefix of at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_main_and_strips_boilerplate() {
        let html = r#"<html><head><title>t</title><style>.x{}</style></head>
            <body>
              <header>Site header</header>
              <nav>Home | About</nav>
              <main>
                <h1>Arbeitszeitgesetz</h1>
                <p>Daily working time must not exceed eight hours.</p>
                <script>track()</script>
              </main>
              <footer>Impressum</footer>
            </body></html>"#;

        let text = html_to_text(html, 5000);
        assert_eq!(
            text,
            "Arbeitszeitgesetz Daily working time must not exceed eight hours."
        );
    }

    #[test]
    fn test_selector_priority_over_document_order() {
        let html = r#"<body>
            <div class="content">Sidebar-ish content</div>
            <article>Article body</article>
        </body>"#;
        assert_eq!(html_to_text(html, 5000), "Article body");
    }

    #[test]
    fn test_main_inside_nav_is_ignored() {
        let html = r#"<body>
            <nav><div id="main">menu</div></nav>
            <div class="policy-content">Leave entitlement: 28 days.</div>
        </body>"#;
        assert_eq!(html_to_text(html, 5000), "Leave entitlement: 28 days.");
    }

    #[test]
    fn test_falls_back_to_body_without_boilerplate() {
        let html = r#"<body><header>Top</header><div>Section 1</div><div>Section 2</div>
            <aside>Related</aside><noscript>Enable JS</noscript></body>"#;
        assert_eq!(html_to_text(html, 5000), "Section 1 Section 2");
    }

    #[test]
    fn test_empty_main_falls_back_to_body() {
        let html = r#"<body><main></main><p>Loaded elsewhere</p></body>"#;
        assert_eq!(html_to_text(html, 5000), "Loaded elsewhere");
    }

    #[test]
    fn test_block_elements_separate_words() {
        let html = "<body><ul><li>One</li><li>Two</li></ul><p>Three<br>Four</p></body>";
        assert_eq!(html_to_text(html, 5000), "One Two Three Four");
    }

    #[test]
    fn test_inline_elements_do_not_split_words() {
        let html = "<body><p>Kün<b>dig</b>ung</p></body>";
        assert_eq!(html_to_text(html, 5000), "Kündigung");
    }

    #[test]
    fn test_entities_decoded() {
        let html = "<body><p>Terms &amp; conditions&nbsp;apply</p></body>";
        assert_eq!(html_to_text(html, 5000), "Terms & conditions apply");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let html = "<body><p>Überstunden und Ausgleich</p></body>";
        assert_eq!(html_to_text(html, 3), "Übe");
        assert_eq!(truncate_chars("äöü", 10), "äöü");
        assert_eq!(truncate_chars("äöü", 0), "");
    }

    #[test]
    fn test_blank_page_is_empty() {
        assert_eq!(html_to_text("<html><body>  \n </body></html>", 5000), "");
        assert_eq!(html_to_text("", 5000), "");
    }
}
