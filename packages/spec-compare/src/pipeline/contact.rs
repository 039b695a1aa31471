//! Contact URL resolution.
//!
//! Best effort, in order:
//!
//! 1. A same-site link on the homepage whose href or text mentions a
//!    contact keyword
//! 2. The first common contact path that answers 200
//! 3. The cheap `{scheme}://{host}/contact` guess
//! 4. The bare homepage, when the guess itself was probed and rejected
//!
//! Each record resolves under its own timeout; a timeout yields the
//! cheap guess. Resolution never fails a record.

use futures::future::join_all;
use tracing::{debug, info};
use url::Url;

use crate::converters::extract_links;
use crate::traits::fetcher::Fetcher;
use crate::types::config::ContactConfig;

/// Resolves contact pages for source URLs.
pub struct ContactResolver<'a, F: Fetcher> {
    fetcher: &'a F,
    config: &'a ContactConfig,
}

impl<'a, F: Fetcher> ContactResolver<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a ContactConfig) -> Self {
        Self { fetcher, config }
    }

    /// Resolve every URL in parallel. Output order matches input.
    pub async fn resolve_all(&self, urls: &[&str]) -> Vec<Option<String>> {
        if !self.config.enabled {
            return vec![None; urls.len()];
        }

        let results = join_all(urls.iter().map(|url| self.resolve_with_timeout(url))).await;
        info!(
            records = urls.len(),
            resolved = results.iter().filter(|r| r.is_some()).count(),
            "Contact resolution complete"
        );
        results
    }

    /// Resolve one URL under the per-record time budget.
    pub async fn resolve_with_timeout(&self, url: &str) -> Option<String> {
        match tokio::time::timeout(self.config.timeout(), self.resolve(url)).await {
            Ok(resolved) => resolved,
            Err(_) => {
                debug!(url, "Contact resolution timed out, using guess");
                derive_contact_url(url)
            }
        }
    }

    /// Resolve one URL without a time limit.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        let home = homepage_url(url)?;
        let guess = home.join("contact").ok()?;

        if !self.config.crawl {
            return Some(guess.to_string());
        }

        if let Some(found) = self.crawl_homepage(&home).await {
            debug!(url, contact = %found, "Contact link found on homepage");
            return Some(found.to_string());
        }

        let mut guess_rejected = false;
        for path in &self.config.probe_paths {
            let Ok(candidate) = home.join(path) else {
                continue;
            };
            match self.fetcher.probe(candidate.as_str()).await {
                Ok(200) => {
                    debug!(url, contact = %candidate, "Contact path answered");
                    return Some(candidate.to_string());
                }
                Ok(_) if candidate == guess => guess_rejected = true,
                _ => {}
            }
        }

        if guess_rejected {
            Some(home.to_string())
        } else {
            Some(guess.to_string())
        }
    }

    async fn crawl_homepage(&self, home: &Url) -> Option<Url> {
        let body = self.fetcher.fetch(home.as_str()).await.ok()?;
        if !body.is_html() {
            return None;
        }

        let base = Url::parse(&body.final_url).unwrap_or_else(|_| home.clone());
        let html = body.text();

        extract_links(&html, &base)
            .into_iter()
            .filter(|link| link.url.host_str() == base.host_str())
            .find(|link| {
                let path = link.url.path().to_lowercase();
                let text = link.text.to_lowercase();
                self.config
                    .keywords
                    .iter()
                    .any(|k| path.contains(k.as_str()) || text.contains(k.as_str()))
            })
            .map(|link| link.url)
    }
}

/// `https://www.maker.example/lit/ds.pdf` -> `https://www.maker.example/`.
pub fn homepage_url(url: &str) -> Option<Url> {
    let mut home = Url::parse(url).ok()?;
    home.host_str()?;
    home.set_path("/");
    home.set_query(None);
    home.set_fragment(None);
    Some(home)
}

/// The cheap `{scheme}://{host}/contact` guess.
pub fn derive_contact_url(url: &str) -> Option<String> {
    homepage_url(url)?.join("contact").ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::MockFetcher;
    use std::time::Duration;

    const SOURCE: &str = "https://maker.example/lit/ds/lm7805.pdf";

    #[test]
    fn test_derive_contact_url() {
        assert_eq!(
            derive_contact_url("https://www.ti.com/lit/ds/lm7805.pdf?x=1#p2").as_deref(),
            Some("https://www.ti.com/contact")
        );
        assert_eq!(
            derive_contact_url("http://maker.example:8080/a").as_deref(),
            Some("http://maker.example:8080/contact")
        );
        assert_eq!(derive_contact_url("not a url"), None);
    }

    #[tokio::test]
    async fn test_homepage_link_wins() {
        let fetcher = MockFetcher::new().with_html(
            "https://maker.example/",
            r#"<a href="https://other.example/contact">Partner</a>
               <a href="/about">About</a>
               <a href="/support/sales">Request a Quote</a>"#,
        );
        let config = ContactConfig::default();
        let resolver = ContactResolver::new(&fetcher, &config);

        assert_eq!(
            resolver.resolve(SOURCE).await.as_deref(),
            Some("https://maker.example/support/sales")
        );
        assert!(fetcher.probe_calls().is_empty());
    }

    #[tokio::test]
    async fn test_first_answering_path() {
        let fetcher = MockFetcher::new()
            .with_probe("https://maker.example/contact", 404)
            .with_probe("https://maker.example/contact-us", 200);
        let config = ContactConfig::default();
        let resolver = ContactResolver::new(&fetcher, &config);

        assert_eq!(
            resolver.resolve(SOURCE).await.as_deref(),
            Some("https://maker.example/contact-us")
        );
    }

    #[tokio::test]
    async fn test_rejected_guess_falls_back_to_homepage() {
        let fetcher = MockFetcher::new();
        let config = ContactConfig::default();
        let resolver = ContactResolver::new(&fetcher, &config);

        assert_eq!(
            resolver.resolve(SOURCE).await.as_deref(),
            Some("https://maker.example/")
        );
    }

    #[tokio::test]
    async fn test_unreachable_probe_keeps_guess() {
        let fetcher =
            MockFetcher::new().with_network_error("https://maker.example/contact", "reset");
        let config = ContactConfig::default();
        let resolver = ContactResolver::new(&fetcher, &config);

        assert_eq!(
            resolver.resolve(SOURCE).await.as_deref(),
            Some("https://maker.example/contact")
        );
    }

    #[tokio::test]
    async fn test_crawl_disabled_uses_guess() {
        let fetcher = MockFetcher::new();
        let config = ContactConfig {
            crawl: false,
            ..Default::default()
        };
        let resolver = ContactResolver::new(&fetcher, &config);

        assert_eq!(
            resolver.resolve(SOURCE).await.as_deref(),
            Some("https://maker.example/contact")
        );
        assert_eq!(fetcher.fetch_call_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_yields_guess() {
        let fetcher = MockFetcher::new()
            .with_html("https://maker.example/", "<a href='/contact'>Contact</a>")
            .with_delay("https://maker.example/", Duration::from_millis(500));
        let config = ContactConfig {
            timeout_ms: 20,
            ..Default::default()
        };
        let resolver = ContactResolver::new(&fetcher, &config);

        let results = resolver.resolve_all(&[SOURCE, "https://fast.example/x"]).await;
        assert_eq!(results[0].as_deref(), Some("https://maker.example/contact"));
        assert_eq!(results[1].as_deref(), Some("https://fast.example/"));
    }

    #[tokio::test]
    async fn test_disabled_resolves_nothing() {
        let fetcher = MockFetcher::new();
        let config = ContactConfig {
            enabled: false,
            ..Default::default()
        };
        let resolver = ContactResolver::new(&fetcher, &config);

        assert_eq!(resolver.resolve_all(&[SOURCE]).await, vec![None]);
    }
}
