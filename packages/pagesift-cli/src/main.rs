use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use pagesift::extractors::ClaudeExtractor;
use pagesift::fetchers::{HttpFetcher, RenderFetcher};
use pagesift::{
    export_results, BatchConfig, BatchPipeline, BatchResult, Fetcher, Schema,
};

/// AI-powered web scraping that returns structured data.
///
/// Extract structured data from websites using a declared field schema
/// instead of brittle CSS selectors.
#[derive(Parser)]
#[command(name = "pagesift", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract structured data from one or more URLs
    Extract {
        /// Single URL to scrape (repeatable)
        #[arg(long)]
        url: Vec<String>,

        /// File containing URLs, one per line
        #[arg(long)]
        urls: Option<PathBuf>,

        /// JSON schema file defining fields to extract
        #[arg(long)]
        schema: PathBuf,

        /// Output file path (.json or .csv)
        #[arg(long)]
        output: PathBuf,

        /// Number of parallel requests
        #[arg(long, default_value_t = 5)]
        parallel: usize,

        /// Render pages with a browser service (slower, handles JavaScript)
        #[arg(long)]
        browser: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// List URLs discovered in a site's sitemap
    Sitemap {
        /// Base URL of the site (e.g. https://example.com)
        base_url: String,

        /// Maximum number of URLs to list
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            url,
            urls,
            schema,
            output,
            parallel,
            browser,
            timeout,
        } => extract(url, urls, schema, output, parallel, browser, timeout).await,
        Command::Sitemap { base_url, limit } => sitemap(&base_url, limit).await,
    }
}

async fn extract(
    url_args: Vec<String>,
    urls_file: Option<PathBuf>,
    schema_path: PathBuf,
    output: PathBuf,
    parallel: usize,
    browser: bool,
    timeout: u64,
) -> Result<()> {
    let urls = load_urls(&url_args, urls_file.as_deref())?;
    let schema = load_schema(&schema_path)?;

    println!("pagesift extraction");
    println!("  urls:     {}", urls.len());
    println!("  schema:   {}", schema_path.display());
    println!("  browser:  {}", if browser { "yes" } else { "no" });
    println!("  parallel: {}", parallel);
    println!();

    let config = BatchConfig::new()
        .with_concurrency(parallel)
        .with_timeout(Duration::from_secs(timeout));

    let result = if browser {
        let fetcher = RenderFetcher::from_env()
            .context("rendered fetching needs RENDER_API_KEY (or drop --browser)")?;
        run_batch(fetcher, config, &urls, &schema).await?
    } else {
        run_batch(HttpFetcher::new(), config, &urls, &schema).await?
    };

    print_summary(&result);

    export_results(&result, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("\nResults saved to {}", output.display());

    Ok(())
}

async fn run_batch<F: Fetcher>(
    fetcher: F,
    config: BatchConfig,
    urls: &[String],
    schema: &Schema,
) -> Result<BatchResult> {
    let extractor = ClaudeExtractor::from_env()
        .context("set ANTHROPIC_API_KEY in the environment or a .env file")?;

    let pipeline = BatchPipeline::new(fetcher, extractor).with_config(config);
    let result = pipeline.run(urls, schema).await?;
    Ok(result)
}

fn load_urls(url_args: &[String], urls_file: Option<&Path>) -> Result<Vec<String>> {
    match (url_args.is_empty(), urls_file) {
        (false, Some(_)) => bail!("provide either --url or --urls, not both"),
        (true, None) => bail!("provide either --url or --urls"),
        (false, None) => Ok(url_args.to_vec()),
        (true, Some(path)) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let urls: Vec<String> = contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect();
            if urls.is_empty() {
                bail!("{} contains no URLs", path.display());
            }
            Ok(urls)
        }
    }
}

fn load_schema(path: &Path) -> Result<Schema> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let schema =
        Schema::from_json(&json).with_context(|| format!("invalid schema in {}", path.display()))?;
    Ok(schema)
}

fn print_summary(result: &BatchResult) {
    println!(
        "✓ {} successful, ✗ {} failed",
        result.success_count(),
        result.failure_count()
    );

    let failures: Vec<_> = result.failures().collect();
    if !failures.is_empty() {
        println!("\nErrors:");
        for outcome in failures.iter().take(5) {
            if let Some(error) = outcome.error() {
                println!("  • {}: {}", outcome.url, error);
            }
        }
        if failures.len() > 5 {
            println!("  ... and {} more", failures.len() - 5);
        }
    }

    if let Some(first_success) = result.iter().find(|o| o.is_success()) {
        println!("\nPreview (first result):");
        match serde_json::to_string_pretty(&first_success.to_json()) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{:?}", first_success.fields()),
        }
    }
}

async fn sitemap(base_url: &str, limit: Option<usize>) -> Result<()> {
    let urls = pagesift::discover_urls(base_url, limit)
        .await
        .with_context(|| format!("sitemap discovery failed for {}", base_url))?;

    if urls.is_empty() {
        println!("No sitemap URLs found for {}", base_url);
        return Ok(());
    }

    for url in &urls {
        println!("{}", url);
    }
    eprintln!("\n{} URLs discovered", urls.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_urls_rejects_both_and_neither() {
        assert!(load_urls(&[], None).is_err());
        assert!(load_urls(&["https://a.example".into()], Some(Path::new("x"))).is_err());
    }

    #[test]
    fn load_urls_from_args() {
        let urls = load_urls(&["https://a.example".into()], None).unwrap();
        assert_eq!(urls, vec!["https://a.example"]);
    }

    #[test]
    fn load_urls_from_file_skips_blanks_and_comments() {
        let path = std::env::temp_dir().join(format!("pagesift-urls-{}.txt", std::process::id()));
        std::fs::write(&path, "https://a.example\n\n# comment\nhttps://b.example\n").unwrap();

        let urls = load_urls(&[], Some(&path)).unwrap();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);

        std::fs::remove_file(&path).ok();
    }
}
