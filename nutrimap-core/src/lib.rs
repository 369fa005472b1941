pub mod crawl;
pub mod error;
pub mod model;
pub mod report;

pub use crawl::{CrawlEvent, CrawlOptions, ProgressCallback, execute_crawl};
pub use error::CoreError;
pub use model::{CategoryEntry, CrawlResult, CrawlSummary, FoodFailure, Outcome};

pub fn print_banner() {
    use colored::Colorize;

    println!(
        "{} {}",
        "nutrimap".bright_green().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!(
        "{}\n",
        "calorie guide harvester: categories → foods → nutrients (µg)".bright_black()
    );
}
