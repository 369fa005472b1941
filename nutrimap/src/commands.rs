use clap::{arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("nutrimap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("nutrimap")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl the calorie guide: every category, every food, every nutrient. \
                Writes the result as JSON and/or CSV.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Catalog page listing the food categories")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(nutrimap_scanner::DEFAULT_CATALOG_URL),
                )
                .arg(
                    arg!(--"origin" <URL>)
                        .required(false)
                        .help("Origin used to resolve relative links (default: origin of --url)")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-o --"output" <DIR>)
                        .required(false)
                        .help("Directory the Data_<timestamp> files are written to")
                        .default_value("."),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: json, csv, both")
                        .value_parser(["json", "csv", "both"])
                        .default_value("both"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Food pages fetched concurrently within a category")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"retries" <COUNT>)
                        .required(false)
                        .help("Retries for timeouts, 429 and 5xx responses (0-10)")
                        .value_parser(clap::value_parser!(u32).range(0..=10))
                        .default_value("2"),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Disable the per-category progress bars")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
