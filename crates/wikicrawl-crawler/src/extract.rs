use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;

use crate::config::ExtractorConfig;

lazy_static! {
    static ref PARAGRAPHS: Selector = Selector::parse("p").unwrap();
}

/// A link found on a page, with the text it can be scored against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub anchor_text: Option<String>,
    pub context: Option<String>,
}

impl Candidate {
    /// A bare path, without any text to score.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            anchor_text: None,
            context: None,
        }
    }

    pub fn with_text(
        path: impl Into<String>,
        anchor_text: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            anchor_text: Some(anchor_text.into()),
            context: Some(context.into()),
        }
    }
}

pub trait LinkExtractor: Send + Sync {
    /// Candidate links of the page's content, in document order.
    fn extract(&self, markup: &str) -> Vec<Candidate>;
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid content selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

/// Extracts internal article links from the content blocks of a page.
#[derive(Debug, Clone)]
pub struct WikiLinkExtractor {
    content: Selector,
    link_prefix: String,
    context_window: usize,
}

impl WikiLinkExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let content =
            Selector::parse(&config.content_selector).map_err(|e| ExtractError::Selector {
                selector: config.content_selector.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            content,
            link_prefix: config.link_prefix.clone(),
            context_window: config.context_window,
        })
    }

    fn extract_block(&self, block: ElementRef, candidates: &mut Vec<Candidate>) {
        let mut text = Vec::<char>::new();
        let mut links = Vec::new();

        // Descendants come in document order, an anchor precedes its own text
        for node in block.descendants() {
            match node.value() {
                Node::Text(t) => text.extend(t.chars()),
                Node::Element(el) if el.name() == "a" => {
                    let Some(href) = el.attr("href") else {
                        continue;
                    };
                    if !href.starts_with(&self.link_prefix) {
                        continue;
                    }
                    let anchor: String = ElementRef::wrap(node)
                        .map(|a| a.text().collect())
                        .unwrap_or_default();
                    links.push((normalize_href(href), anchor, text.len()));
                }
                _ => (),
            }
        }

        for (path, anchor, start) in links {
            let end = (start + anchor.chars().count()).min(text.len());
            let before = &text[start.saturating_sub(self.context_window)..start];
            let after = &text[end..(end + self.context_window).min(text.len())];
            let context = before
                .iter()
                .chain(std::iter::once(&' '))
                .chain(after.iter())
                .collect::<String>();
            candidates.push(Candidate::with_text(path, anchor.trim(), context.trim()));
        }
    }
}

impl Default for WikiLinkExtractor {
    fn default() -> Self {
        Self {
            content: PARAGRAPHS.clone(),
            link_prefix: String::from("/wiki/"),
            context_window: 100,
        }
    }
}

impl LinkExtractor for WikiLinkExtractor {
    fn extract(&self, markup: &str) -> Vec<Candidate> {
        let document = Html::parse_document(markup);
        let mut candidates = Vec::new();
        for block in document.select(&self.content) {
            self.extract_block(block, &mut candidates);
        }
        candidates
    }
}

/// Drops the query string, keeps the fragment.
fn normalize_href(href: &str) -> String {
    let (path, fragment) = match href.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (href, None),
    };
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    match fragment {
        Some(fragment) => format!("{path}#{fragment}"),
        None => path.to_string(),
    }
}
