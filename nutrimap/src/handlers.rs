use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDateTime};
use clap::ArgMatches;
use colored::Colorize;
use nutrimap_core::crawl::{CrawlOptions, DEFAULT_WORKERS, execute_crawl};
use nutrimap_core::model::Outcome;
use nutrimap_core::report::{
    ReportFormat, generate_crawl_report, output_paths, save_report, to_csv, to_json,
};
use nutrimap_core::CrawlResult;
use nutrimap_scanner::{DEFAULT_BACKOFF_MS, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS, HttpFetcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Everything `crawl` needs, resolved from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSettings {
    pub catalog_url: Url,
    pub origin: Url,
    pub output_dir: PathBuf,
    pub format: ReportFormat,
    pub workers: usize,
    pub timeout_secs: u64,
    pub retries: u32,
    pub show_progress: bool,
}

impl CrawlSettings {
    pub fn from_matches(args: &ArgMatches) -> Result<Self> {
        let catalog_url = match args.get_one::<Url>("url") {
            Some(url) => url.clone(),
            None => Url::parse(nutrimap_scanner::DEFAULT_CATALOG_URL)?,
        };
        let origin = match args.get_one::<Url>("origin") {
            Some(origin) => origin.clone(),
            None => origin_of(&catalog_url)?,
        };
        let output = args
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or(".");
        let format = parse_format(
            args.get_one::<String>("format")
                .map(String::as_str)
                .unwrap_or("both"),
        )?;

        Ok(Self {
            catalog_url,
            origin,
            output_dir: resolve_output_dir(output),
            format,
            workers: args
                .get_one::<usize>("threads")
                .copied()
                .unwrap_or(DEFAULT_WORKERS),
            timeout_secs: args
                .get_one::<u64>("timeout")
                .copied()
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            retries: args
                .get_one::<u32>("retries")
                .copied()
                .unwrap_or(DEFAULT_RETRIES),
            show_progress: !args.get_flag("no-progress"),
        })
    }

    pub fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            catalog_url: self.catalog_url.to_string(),
            origin: self.origin.to_string(),
            workers: self.workers,
            show_progress_bars: self.show_progress,
        }
    }

    pub fn fetcher(&self) -> Result<HttpFetcher> {
        let fetcher = HttpFetcher::with_timeout(self.timeout_secs)
            .context("Failed to build HTTP client")?
            .with_retries(self.retries)
            .with_backoff(Duration::from_millis(DEFAULT_BACKOFF_MS));
        Ok(fetcher)
    }
}

/// Scheme, host and port of `url`, as a URL with an empty path.
pub fn origin_of(url: &Url) -> Result<Url> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(anyhow!("URL has no usable origin: {}", url));
    }
    Ok(Url::parse(&origin.ascii_serialization())?)
}

pub fn parse_format(raw: &str) -> Result<ReportFormat> {
    ReportFormat::from_str(raw).ok_or_else(|| anyhow!("Unknown output format: {}", raw))
}

/// Expand `~` in the output directory.
pub fn resolve_output_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Install the fmt subscriber. `RUST_LOG` wins over the default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Write the requested exports into `dir`, creating it if needed.
pub fn write_reports(
    result: &CrawlResult,
    dir: &Path,
    format: ReportFormat,
    generated_at: NaiveDateTime,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let (json_path, csv_path) = output_paths(dir, generated_at);
    let mut written = Vec::new();

    if format.includes_json() {
        let content = to_json(result)?;
        save_report(&content, &json_path)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("JSON export saved to {}", json_path.display());
        written.push(json_path);
    }
    if format.includes_csv() {
        let content = to_csv(result)?;
        save_report(&content, &csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        info!("CSV export saved to {}", csv_path.display());
        written.push(csv_path);
    }

    Ok(written)
}

/// Crawl with a fresh HTTP fetcher.
pub async fn run_crawl(settings: &CrawlSettings) -> Result<CrawlResult> {
    let fetcher = settings.fetcher()?;
    let result = execute_crawl(&fetcher, &settings.crawl_options(), None).await?;
    Ok(result)
}

pub async fn handle_crawl(args: &ArgMatches) {
    init_tracing();

    let settings = match CrawlSettings::from_matches(args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    println!("Crawling {}", settings.catalog_url.as_str().bright_white());
    println!("Workers: {}", settings.workers.max(1));
    println!("Output: {}\n", settings.output_dir.display());

    let result = match run_crawl(&settings).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    println!("\n{}", generate_crawl_report(&result));

    if let Outcome::Failed(reason) = &result.catalog {
        eprintln!("{} Failed to retrieve the catalog: {}", "✗".red(), reason);
        std::process::exit(1);
    }
    if result.is_empty() {
        println!("{} No data to save", "⚠".yellow());
        return;
    }

    match write_reports(
        &result,
        &settings.output_dir,
        settings.format,
        Local::now().naive_local(),
    ) {
        Ok(paths) => {
            for path in paths {
                println!("{} Saved {}", "✓".green(), path.display());
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}
