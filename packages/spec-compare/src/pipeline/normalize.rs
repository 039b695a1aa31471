//! Content normalization - bytes to bounded markdown.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::converters::ConverterSet;
use crate::error::AcquireError;
use crate::types::config::NormalizeConfig;
use crate::types::content::{AcquiredContent, ContentState};

/// Keep at most `max_chars` characters from the head of `text`.
///
/// Counts characters, not bytes, so the cut never splits a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Converts downloaded content to markdown and enforces size bounds.
pub struct ContentNormalizer<'a> {
    converters: &'a ConverterSet,
    config: &'a NormalizeConfig,
}

impl<'a> ContentNormalizer<'a> {
    pub fn new(converters: &'a ConverterSet, config: &'a NormalizeConfig) -> Self {
        Self { converters, config }
    }

    /// Normalize one acquired document.
    ///
    /// Failed content passes through unchanged. Conversion errors and
    /// text below the minimum after truncation become failures.
    pub async fn normalize(&self, content: AcquiredContent) -> AcquiredContent {
        let (bytes, format) = match &content.state {
            ContentState::Downloaded { bytes, format, .. } => (bytes, *format),
            _ => return content,
        };

        let converted = self.converters.for_format(format).to_markdown(bytes).await;
        let markdown = match converted {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!(url = %content.url(), error = %e, "Conversion failed");
                return content.into_failed(e.into());
            }
        };

        let total_chars = markdown.chars().count();
        let kept = truncate_chars(markdown.trim(), self.config.max_chars);
        let kept_chars = kept.chars().count();
        let truncated = kept_chars < markdown.trim().chars().count();

        if kept.trim().chars().count() < self.config.min_chars {
            debug!(url = %content.url(), chars = kept_chars, "Insufficient content");
            return content.into_failed(AcquireError::NoContent {
                chars: kept.trim().chars().count(),
                min: self.config.min_chars,
            });
        }

        debug!(
            url = %content.url(),
            total_chars,
            kept_chars,
            truncated,
            "Content normalized"
        );

        let kept = kept.to_string();
        content.with_text(kept, truncated)
    }

    /// Normalize every document concurrently, preserving order.
    pub async fn normalize_all(&self, contents: Vec<AcquiredContent>) -> Vec<AcquiredContent> {
        join_all(contents.into_iter().map(|c| self.normalize(c))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConverter;
    use crate::types::content::DocumentFormat;
    use crate::types::source::CandidateSource;
    use std::sync::Arc;

    fn downloaded(url: &str, body: &str) -> AcquiredContent {
        AcquiredContent::downloaded(
            CandidateSource::datasheet(url),
            url,
            body.as_bytes().to_vec(),
            DocumentFormat::Pdf,
            Some(1),
        )
    }

    fn converters() -> ConverterSet {
        let mock = Arc::new(MockConverter::new());
        ConverterSet::new(mock.clone(), mock)
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("°C°C", 3), "°C°");
    }

    #[tokio::test]
    async fn test_truncates_to_budget() {
        let converters = converters();
        let config = NormalizeConfig {
            max_chars: 150,
            min_chars: 100,
        };
        let normalizer = ContentNormalizer::new(&converters, &config);

        let content = normalizer.normalize(downloaded("u", &"a".repeat(500))).await;
        assert_eq!(content.text().map(|t| t.chars().count()), Some(150));
        assert!(matches!(
            content.state,
            ContentState::Normalized { truncated: true, .. }
        ));
    }

    #[tokio::test]
    async fn test_short_content_fails() {
        let converters = converters();
        let config = NormalizeConfig::default();
        let normalizer = ContentNormalizer::new(&converters, &config);

        let content = normalizer.normalize(downloaded("u", "tiny")).await;
        assert!(matches!(
            content.error(),
            Some(AcquireError::NoContent { chars: 4, min: 100 })
        ));
    }

    #[tokio::test]
    async fn test_conversion_error_fails() {
        let mock = Arc::new(MockConverter::new().with_failure("unreadable"));
        let converters = ConverterSet::new(mock.clone(), mock);
        let config = NormalizeConfig::default();
        let normalizer = ContentNormalizer::new(&converters, &config);

        let content = normalizer.normalize(downloaded("u", &"a".repeat(500))).await;
        assert!(matches!(content.error(), Some(AcquireError::Unextractable(_))));
        assert_eq!(
            content.error().map(|e| e.kind()),
            Some(crate::types::record::ErrorKind::NoContent)
        );
    }

    #[tokio::test]
    async fn test_empty_conversion_is_no_content() {
        let converters = converters();
        let config = NormalizeConfig::default();
        let normalizer = ContentNormalizer::new(&converters, &config);

        let content = normalizer.normalize(downloaded("u", "%only comment lines")).await;
        assert_eq!(
            content.error().map(|e| e.kind()),
            Some(crate::types::record::ErrorKind::NoContent)
        );
    }

    #[tokio::test]
    async fn test_failed_content_passes_through() {
        let converters = converters();
        let config = NormalizeConfig::default();
        let normalizer = ContentNormalizer::new(&converters, &config);

        let failed = AcquiredContent::failed(
            CandidateSource::datasheet("u"),
            AcquireError::Http { status: 500 },
        );
        let content = normalizer.normalize(failed).await;
        assert_eq!(content.error(), Some(&AcquireError::Http { status: 500 }));
    }
}
