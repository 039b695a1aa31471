//! HTML to markdown conversion using `scraper` and `htmd`.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{ConvertError, ConvertResult};
use crate::traits::converter::DocumentConverter;

/// Converts supplier and product pages to markdown.
///
/// Navigation, headers, footers and scripts are stripped so the model
/// sees the page body.
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter;

impl HtmlConverter {
    pub fn new() -> Self {
        Self
    }

    /// Extract main content HTML, stripping nav/header/footer/aside.
    fn extract_main_content(document: &Html) -> String {
        let main_selectors = [
            "main",
            "article",
            "[role='main']",
            "#content",
            "#main",
            ".content",
            ".main",
        ];

        for selector_str in main_selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(main) = document.select(&selector).next() {
                    return Self::remove_boilerplate(&main.html());
                }
            }
        }

        if let Ok(body_selector) = Selector::parse("body") {
            if let Some(body) = document.select(&body_selector).next() {
                return Self::remove_boilerplate(&body.html());
            }
        }

        document.html()
    }

    fn remove_boilerplate(html: &str) -> String {
        let document = Html::parse_fragment(html);
        let unwanted = [
            "nav", "header", "footer", "aside", "script", "style", "noscript", "iframe", "form",
            ".navbar", ".sidebar", ".menu", ".cookie", "#cookie-banner",
        ];

        let mut result = html.to_string();
        for selector_str in unwanted {
            if let Ok(selector) = Selector::parse(selector_str) {
                for element in document.select(&selector) {
                    result = result.replace(&element.html(), "");
                }
            }
        }

        result
    }

    /// Convert an HTML string to markdown.
    pub fn html_to_markdown(html: &str) -> String {
        let document = Html::parse_document(html);
        let content = Self::extract_main_content(&document);

        htmd::convert(&content).unwrap_or_else(|_| {
            let fragment = Html::parse_fragment(&content);
            fragment.root_element().text().collect::<Vec<_>>().join(" ")
        })
    }
}

#[async_trait]
impl DocumentConverter for HtmlConverter {
    async fn page_count(&self, _bytes: &[u8]) -> ConvertResult<usize> {
        Ok(1)
    }

    async fn to_markdown(&self, bytes: &[u8]) -> ConvertResult<String> {
        let html = String::from_utf8_lossy(bytes);
        let markdown = Self::html_to_markdown(&html);

        let markdown = collapse_blank_lines(&markdown);
        if markdown.trim().is_empty() {
            return Err(ConvertError::Empty);
        }
        Ok(markdown)
    }
}

/// An anchor found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Absolute URL
    pub url: Url,

    /// Visible link text, trimmed
    pub text: String,
}

/// Absolute links from an HTML page, in document order, deduplicated.
///
/// Fragments, `javascript:`, `mailto:` and `tel:` links are skipped.
pub fn extract_links(html: &str, base_url: &Url) -> Vec<PageLink> {
    let document = Html::parse_document(html);
    let link_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    let mut seen = std::collections::HashSet::new();
    document
        .select(&link_selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                return None;
            }
            let mut url = base_url.join(href).ok()?;
            url.set_fragment(None);
            let text = el.text().collect::<Vec<_>>().join(" ").trim().to_string();
            Some(PageLink { url, text })
        })
        .filter(|link| seen.insert(link.url.to_string()))
        .collect()
}

/// Squeeze runs of blank lines down to one.
pub(crate) fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
