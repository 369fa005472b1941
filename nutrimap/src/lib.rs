pub mod commands;
pub mod handlers;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    CrawlSettings, origin_of, parse_format, resolve_output_dir, run_crawl, write_reports,
};
