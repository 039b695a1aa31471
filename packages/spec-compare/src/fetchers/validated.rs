//! Fetcher wrapper that validates every URL first.

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};
use crate::security::UrlValidator;
use crate::traits::fetcher::{FetchedBody, Fetcher};

/// A fetcher that rejects internal and non-HTTP URLs before fetching.
///
/// Redirect targets are validated too: a public URL that redirects
/// into a private range is refused after the fact.
pub struct ValidatedFetcher<F: Fetcher> {
    inner: F,
    validator: UrlValidator,
}

impl<F: Fetcher> ValidatedFetcher<F> {
    /// Create a new validated fetcher.
    pub fn new(fetcher: F) -> Self {
        Self {
            inner: fetcher,
            validator: UrlValidator::new(),
        }
    }

    /// Create with a custom validator.
    pub fn with_validator(fetcher: F, validator: UrlValidator) -> Self {
        Self {
            inner: fetcher,
            validator,
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for ValidatedFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedBody> {
        self.validator
            .validate_with_dns(url)
            .await
            .map_err(FetchError::Security)?;

        let body = self.inner.fetch(url).await?;

        if body.final_url != url {
            self.validator
                .validate(&body.final_url)
                .map_err(FetchError::Security)?;
        }

        Ok(body)
    }

    async fn probe(&self, url: &str) -> FetchResult<u16> {
        self.validator.validate(url).map_err(FetchError::Security)?;
        self.inner.probe(url).await
    }
}
