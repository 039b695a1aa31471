//! Command-line front end for spec comparison.
//!
//! Finds datasheets (or supplier pages) for a query, extracts their
//! specifications and prints a comparison table. Logs go to stderr so
//! `--json` output can be piped.

mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use spec_compare::ai::Anthropic;
use spec_compare::{
    CandidateSource, CompareConfig, CompareError, CompareRequest, Comparator, HttpFetcher,
    SourceKind, TavilyWebSearcher, ValidatedFetcher,
};

/// Marketplaces whose listings never carry a manufacturer datasheet.
const MARKETPLACE_DOMAINS: &[&str] = &["alibaba.com", "aliexpress.com", "dhgate.com", "ebay.com"];

#[derive(Parser)]
#[command(name = "spec-compare")]
#[command(about = "Compare product specifications across datasheets and supplier pages")]
struct Cli {
    /// Product or part to look up, e.g. "LM7805 voltage regulator"
    query: String,

    /// What to compare: datasheet or page
    #[arg(long, default_value = "datasheet")]
    kind: SourceKind,

    /// Number of sources to discover
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Compare these URLs instead of searching (repeatable)
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Columns in the comparison table
    #[arg(long, default_value_t = 5)]
    columns: usize,

    /// Columns every pair of sources must share
    #[arg(long)]
    min_common: Option<usize>,

    /// Supplier to focus the search on
    #[arg(long)]
    supplier: Option<String>,

    /// Product category hint for extraction
    #[arg(long)]
    category: Option<String>,

    /// Whole-request budget in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Use guessed contact URLs instead of crawling supplier sites
    #[arg(long)]
    no_contact_crawl: bool,

    /// Record stage timings and dump normalized markdown
    #[arg(long)]
    debug: bool,

    /// Where `--debug` writes markdown dumps
    #[arg(long, default_value = "debug")]
    dump_dir: PathBuf,

    /// Print the response as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> CompareConfig {
        let mut config = CompareConfig::default()
            .with_column_count(self.columns)
            .with_request_timeout(Duration::from_secs(self.timeout))
            .with_contact_crawl(!self.no_contact_crawl)
            .with_debug(self.debug);

        if let Some(min_common) = self.min_common {
            config = config.with_min_common(min_common);
        }
        if self.debug {
            config.debug.dump_dir = Some(self.dump_dir.clone());
        }
        config
    }

    fn request(&self) -> CompareRequest {
        let mut request = CompareRequest::new(&self.query).with_kind(self.kind);
        if let Some(count) = self.count {
            request = request.with_count(count);
        }
        if let Some(supplier) = &self.supplier {
            request = request.with_supplier(supplier);
        }
        if let Some(category) = &self.category {
            request = request.with_category(category);
        }
        request
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spec_compare=debug".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let ai = Anthropic::from_env().context("ANTHROPIC_API_KEY must be set")?;
    let searcher = TavilyWebSearcher::from_env()
        .context("TAVILY_API_KEY must be set")?
        .with_excluded_domains(MARKETPLACE_DOMAINS);
    let fetcher = ValidatedFetcher::new(HttpFetcher::new());

    let comparator = Comparator::new(ai, fetcher, searcher).with_config(cli.config());
    let request = cli.request();

    tracing::info!(query = %cli.query, kind = %cli.kind, "Starting comparison");

    let result = if cli.urls.is_empty() {
        comparator.compare(&request).await
    } else {
        let sources = cli
            .urls
            .iter()
            .map(|url| CandidateSource::new(url.as_str(), cli.kind))
            .collect();
        comparator.compare_sources(&request, sources).await
    };

    let response = match result {
        Ok(response) => response,
        Err(CompareError::NoUsableSources { failures }) => {
            output::print_failures(&failures);
            bail!("No usable sources for \"{}\"", cli.query);
        }
        Err(e) => return Err(e).context("Comparison failed"),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        output::print_response(&response);
    }

    Ok(())
}
