//! Document converters.
//!
//! - `PdfConverter` - datasheets (pdf-extract text, lopdf page counts)
//! - `HtmlConverter` - supplier pages (scraper + htmd)

mod html;
mod pdf;

use std::sync::Arc;

pub use html::{extract_links, HtmlConverter, PageLink};
pub(crate) use html::collapse_blank_lines;
pub use pdf::{layout_to_markdown, PdfConverter};

use crate::traits::converter::DocumentConverter;
use crate::types::content::DocumentFormat;

/// One converter per document format.
#[derive(Clone)]
pub struct ConverterSet {
    pub pdf: Arc<dyn DocumentConverter>,
    pub html: Arc<dyn DocumentConverter>,
}

impl Default for ConverterSet {
    fn default() -> Self {
        Self {
            pdf: Arc::new(PdfConverter::new()),
            html: Arc::new(HtmlConverter::new()),
        }
    }
}

impl ConverterSet {
    pub fn new(pdf: Arc<dyn DocumentConverter>, html: Arc<dyn DocumentConverter>) -> Self {
        Self { pdf, html }
    }

    pub fn for_format(&self, format: DocumentFormat) -> &dyn DocumentConverter {
        match format {
            DocumentFormat::Pdf => self.pdf.as_ref(),
            DocumentFormat::Html => self.html.as_ref(),
        }
    }
}
