//! Document converter trait.
//!
//! Converters turn downloaded bytes into markdown for the model and
//! report page counts for the datasheet page ceiling.

use async_trait::async_trait;

use crate::error::ConvertResult;

/// Converts one document format into markdown.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Number of pages in the document.
    async fn page_count(&self, bytes: &[u8]) -> ConvertResult<usize>;

    /// Markdown rendering of the document text.
    async fn to_markdown(&self, bytes: &[u8]) -> ConvertResult<String>;
}
