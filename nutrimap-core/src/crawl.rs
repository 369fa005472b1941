use crate::error::{CoreError, Result};
use crate::model::{CategoryEntry, CrawlResult, CrawlSummary, FoodFailure, Outcome};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use nutrimap_scanner::{
    CategoryRef, FoodRecord, FoodRef, Fetcher, Nutrients, extract_categories, extract_foods,
    extract_nutrients,
};
use scraper::Html;
use std::sync::{Arc, Mutex as StdMutex};
use tracing::{debug, info, warn};
use url::Url;

/// Default number of food pages fetched concurrently within a category.
pub const DEFAULT_WORKERS: usize = 4;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub catalog_url: String,
    pub origin: String,
    pub workers: usize,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            catalog_url: nutrimap_scanner::DEFAULT_CATALOG_URL.to_string(),
            origin: nutrimap_scanner::DEFAULT_ORIGIN.to_string(),
            workers: DEFAULT_WORKERS,
            show_progress_bars: false,
        }
    }
}

/// Progress of a crawl. Indices and counters are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    CatalogFailed {
        url: String,
        reason: String,
    },
    CatalogLoaded {
        categories: usize,
    },
    CategoryStarted {
        index: usize,
        total: usize,
        identifier: String,
    },
    CategoryFailed {
        index: usize,
        total: usize,
        identifier: String,
        reason: String,
    },
    FoodProcessed {
        identifier: String,
        name: String,
        current: usize,
        total: usize,
        outcome: Outcome,
    },
    CategoryCompleted {
        index: usize,
        total: usize,
        identifier: String,
        recorded: usize,
        failed: usize,
    },
    Finished(CrawlSummary),
}

/// Callback for reporting crawl progress
pub type ProgressCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

struct Progress {
    sinks: Vec<ProgressCallback>,
}

impl Progress {
    fn emit(&self, event: CrawlEvent) {
        for sink in &self.sinks {
            sink(event.clone());
        }
    }
}

/// Crawl the catalog, every category and every food page.
///
/// Only an unparseable origin is an error. A catalog that cannot be fetched
/// produces an empty result with a failed catalog outcome; category and food
/// failures are recorded and skipped.
pub async fn execute_crawl<F: Fetcher + Sync>(
    fetcher: &F,
    options: &CrawlOptions,
    progress_callback: Option<ProgressCallback>,
) -> Result<CrawlResult> {
    let origin = Url::parse(&options.origin)
        .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", options.origin, e)))?;
    let workers = options.workers.max(1);

    let mut sinks = Vec::new();
    if options.show_progress_bars {
        sinks.push(progress_bar_callback());
    }
    sinks.extend(progress_callback);
    let progress = Progress { sinks };

    info!(
        "Starting crawl of {} with {} workers",
        options.catalog_url, workers
    );

    let categories = match fetcher.fetch(&options.catalog_url).await {
        Ok(body) => parse_categories(&body, &origin),
        Err(e) => {
            warn!("Failed to retrieve catalog {}: {}", options.catalog_url, e);
            progress.emit(CrawlEvent::CatalogFailed {
                url: options.catalog_url.clone(),
                reason: e.to_string(),
            });
            return Ok(CrawlResult::catalog_failed(e.to_string()));
        }
    };
    progress.emit(CrawlEvent::CatalogLoaded {
        categories: categories.len(),
    });

    let total = categories.len();
    let mut result = CrawlResult::new();

    for (idx, category) in categories.into_iter().enumerate() {
        let index = idx + 1;
        let identifier = category.identifier.clone();
        progress.emit(CrawlEvent::CategoryStarted {
            index,
            total,
            identifier: identifier.clone(),
        });

        let body = match fetcher.fetch(&category.source_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("{}/{} FAILED: {}: {}", index, total, identifier, e);
                progress.emit(CrawlEvent::CategoryFailed {
                    index,
                    total,
                    identifier: identifier.clone(),
                    reason: e.to_string(),
                });
                if !result.insert(CategoryEntry::failed(category, e.to_string())) {
                    info!("Keeping the foods already recorded for {}", identifier);
                }
                continue;
            }
        };

        let foods = parse_foods(&body, &identifier, &origin);
        let entry = crawl_category(fetcher, category, foods, workers, &progress).await;

        info!(
            "{}/{} DONE: {} with {} foods",
            index,
            total,
            identifier,
            entry.foods.len()
        );
        progress.emit(CrawlEvent::CategoryCompleted {
            index,
            total,
            identifier,
            recorded: entry.foods.len(),
            failed: entry.failures.len(),
        });
        result.insert(entry);
    }

    let summary = result.summary();
    info!(
        "Crawl complete. {} categories, {} foods recorded, {} foods failed",
        summary.categories(),
        summary.foods_recorded,
        summary.foods_failed
    );
    progress.emit(CrawlEvent::Finished(summary));

    Ok(result)
}

/// Fetch the foods of one category with at most `workers` requests in flight.
///
/// `buffered` yields pages in submission order, so records land in discovery
/// order whatever order the responses arrive in.
async fn crawl_category<F: Fetcher + Sync>(
    fetcher: &F,
    category: CategoryRef,
    foods: Vec<FoodRef>,
    workers: usize,
    progress: &Progress,
) -> CategoryEntry {
    let identifier = category.identifier.clone();
    let total = foods.len();
    let mut entry = CategoryEntry {
        category,
        outcome: Outcome::Ok,
        foods: Vec::with_capacity(total),
        failures: Vec::new(),
    };

    let mut pages = stream::iter(foods)
        .map(|food| async move {
            let page = fetcher.fetch(&food.source_url).await;
            (food, page)
        })
        .buffered(workers);

    let mut current = 0;
    while let Some((food, page)) = pages.next().await {
        current += 1;
        let name = food.name.clone();
        let outcome = match page {
            Ok(body) => {
                let nutrients = parse_nutrients(&body);
                debug!("{}: {} nutrients for {}", identifier, nutrients.len(), name);
                entry.foods.push(FoodRecord::new(food, nutrients));
                Outcome::Ok
            }
            Err(e) => {
                warn!("Failed to retrieve the page for {}: {}", food.source_url, e);
                let reason = e.to_string();
                entry.failures.push(FoodFailure {
                    food,
                    reason: reason.clone(),
                });
                Outcome::Failed(reason)
            }
        };

        progress.emit(CrawlEvent::FoodProcessed {
            identifier: identifier.clone(),
            name,
            current,
            total,
            outcome,
        });
    }

    entry
}

fn parse_categories(body: &str, origin: &Url) -> Vec<CategoryRef> {
    let document = Html::parse_document(body);
    extract_categories(&document, origin)
}

fn parse_foods(body: &str, identifier: &str, origin: &Url) -> Vec<FoodRef> {
    let document = Html::parse_document(body);
    extract_foods(&document, identifier, origin)
}

fn parse_nutrients(body: &str) -> Nutrients {
    let document = Html::parse_document(body);
    extract_nutrients(&document)
}

/// Terminal sink: one ten-cell bar per category.
pub fn progress_bar_callback() -> ProgressCallback {
    let style = ProgressStyle::default_bar()
        .template("{prefix:.bold} [{bar:10.cyan}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let current: Arc<StdMutex<Option<ProgressBar>>> = Arc::new(StdMutex::new(None));

    Arc::new(move |event: CrawlEvent| {
        let mut bar = current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match event {
            CrawlEvent::CategoryStarted {
                index,
                total,
                identifier,
            } => {
                let pb = ProgressBar::new(0);
                pb.set_style(style.clone());
                pb.set_prefix(format!("{}/{} {}", index, total, identifier));
                *bar = Some(pb);
            }
            CrawlEvent::FoodProcessed { current, total, .. } => {
                if let Some(pb) = bar.as_ref() {
                    pb.set_length(total as u64);
                    pb.set_position(current as u64);
                }
            }
            CrawlEvent::CategoryCompleted {
                recorded, failed, ..
            } => {
                if let Some(pb) = bar.take() {
                    pb.finish_with_message(format!("DONE ({} foods, {} failed)", recorded, failed));
                }
            }
            CrawlEvent::CategoryFailed { reason, .. } => {
                if let Some(pb) = bar.take() {
                    pb.abandon_with_message(format!("FAILED: {}", reason));
                }
            }
            _ => {}
        }
    })
}
