use crate::http::{HttpResponse, ResponseType};
use crate::{ScraperError, ScraperResult};
use log::{debug, trace};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

const ANCHOR_SELECTOR: &str = "a[href]";

/// Pulls anchor targets out of HTML responses.
pub struct LinkExtractor {
    selector: Selector,
}

impl LinkExtractor {
    pub fn new() -> ScraperResult<Self> {
        Self::with_selector(ANCHOR_SELECTOR)
    }

    pub fn with_selector(css: &str) -> ScraperResult<Self> {
        let selector = Selector::parse(css)
            .map_err(|e| ScraperError::ParsingError(format!("invalid selector {css:?}: {e}")))?;
        Ok(Self { selector })
    }

    /// Absolute http(s) URLs of every link in the page, resolved against the
    /// response URL, fragments dropped, in document order without repeats.
    /// Non-HTML responses have no links.
    pub fn extract(&self, response: &HttpResponse) -> Vec<Url> {
        if response.response_type != ResponseType::Html {
            debug!(
                "Not extracting links from {} ({:?})",
                response.url, response.response_type
            );
            return Vec::new();
        }

        self.extract_from_html(&response.text(), &response.url)
    }

    pub fn extract_from_html(&self, html: &str, base: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        let base = document_base(&document, base);

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for element in document.select(&self.selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();
            match base.join(href) {
                Ok(mut url) if matches!(url.scheme(), "http" | "https") => {
                    url.set_fragment(None);
                    if seen.insert(url.to_string()) {
                        links.push(url);
                    }
                }
                Ok(url) => trace!("Ignoring non-http link {}", url),
                Err(e) => trace!("Ignoring unparsable link {:?}: {}", href, e),
            }
        }

        links
    }
}

/// Honours `<base href>` when the page declares one.
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}
