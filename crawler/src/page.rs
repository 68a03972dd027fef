use corpus::text::normalize_whitespace;
use lazy_static::lazy_static;
use reqwest::Url;
use scraper::{Html, Selector};

lazy_static! {
    static ref BODY: Selector = Selector::parse("body").expect("valid selector");
    static ref LINKS: Selector = Selector::parse("body a[href]").expect("valid selector");
}

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text of the page body, pieces joined by spaces and whitespace
/// normalized. Falls back to the whole document when there is no `<body>`.
pub fn page_text(doc: &Html) -> String {
    let root = doc.select(&BODY).next().unwrap_or_else(|| doc.root_element());
    let mut pieces: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else { continue };
        let hidden = node.ancestors().any(|a| {
            a.value().as_element().is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            pieces.push(&**text);
        }
    }
    normalize_whitespace(&pieces.join(" "))
}

/// Absolute http(s) targets of `<a href>` inside the body, fragments removed,
/// in document order.
pub fn link_urls(base: &Url, doc: &Html) -> Vec<Url> {
    doc.select(&LINKS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .map(|u| norm(&u))
        .collect()
}

pub fn norm(u: &Url) -> Url { let mut s = u.clone(); s.set_fragment(None); s }
