use clap::{ArgAction, arg, command, value_parser};
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn seed_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL>)
            .required(false)
            .action(ArgAction::Append)
            .help("A base URL to harvest (repeatable). Search queries in google queries mode"),
    )
    .arg(
        arg!(-H --"hosts-file" <PATH>)
            .required(false)
            .help("Path to a newline-delimited file of URLs")
            .value_parser(value_parser!(PathBuf)),
    )
}

fn output_arg(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-o --"output" <DIR>)
            .required(false)
            .help("Directory reports are written to")
            .default_value("."),
    )
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkharvest")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkharvest")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(crawl_command())
        .subcommand(
            command!("sitemap")
                .about("Work with the sitemaps of one or more sites")
                .subcommand_required(true)
                .subcommand(
                    seed_args(command!("validate"))
                        .about("Report which base URLs expose a usable sitemap"),
                )
                .subcommand(output_arg(seed_args(
                    command!("extract")
                        .about("Extract content from every page listed in the sitemaps")
                        .arg(
                            arg!(-p --"max-pages" <NUM>)
                                .required(false)
                                .help("Maximum number of sitemap pages to extract")
                                .value_parser(value_parser!(usize))
                                .default_value("50"),
                        )
                        .arg(
                            arg!(--"delay" <MS>)
                                .required(false)
                                .help("Milliseconds to wait between requests")
                                .value_parser(value_parser!(u64))
                                .default_value("0"),
                        )
                        .arg(arg!(--"metadata" "Extract meta description, keywords and Open Graph tags"))
                        .arg(arg!(--"no-text" "Skip structured text extraction"))
                        .arg(arg!(--"broken-links" "Check the first links of every page for 404s")),
                ))),
        )
}

fn crawl_command() -> clap::Command {
    let cmd = command!("crawl")
        .about("Harvest one or more sites breadth-first and write text and CSV reports")
        .arg(
            arg!(--"settings" <FILE>)
                .required(false)
                .help("Load a JSON settings object; flags given here override it")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-m --"mode" <MODE>)
                .required(false)
                .help("How seeds are interpreted")
                .value_parser(["single", "list", "google"]),
        )
        .arg(
            arg!(--"google-mode" <GOOGLE_MODE>)
                .required(false)
                .help("In google mode: harvest a results page or run queries")
                .value_parser(["current-page", "queries"]),
        )
        .arg(
            arg!(-d --"max-depth" <DEPTH>)
                .required(false)
                .help("Maximum path depth below each base URL [default: 0]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(-p --"max-pages" <NUM>)
                .required(false)
                .help("Maximum pages fetched per base URL [default: 50]")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"delay" <MS>)
                .required(false)
                .help("Milliseconds to wait between requests")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            arg!(--"filter-contains" <TEXT>)
                .required(false)
                .help("Only follow links containing TEXT (case-insensitive)")
                .conflicts_with("filter-regex"),
        )
        .arg(
            arg!(--"filter-regex" <PATTERN>)
                .required(false)
                .help("Only follow links matching PATTERN")
                .conflicts_with("filter-contains"),
        )
        .arg(
            arg!(--"webhook" <URL>)
                .required(false)
                .help("POST a JSON summary to URL when the crawl completes"),
        )
        .arg(arg!(--"html" "Keep raw HTML extraction enabled in the settings summary"))
        .arg(arg!(--"no-text" "Skip structured text extraction"))
        .arg(arg!(--"metadata" "Extract meta description, keywords and Open Graph tags"))
        .arg(arg!(--"sitemap" "Seed each base URL from its sitemap"))
        .arg(arg!(--"keywords" "Keyword density and n-gram analysis"))
        .arg(arg!(--"broken-links" "Check the first links of every page for 404s"))
        .arg(arg!(--"csv" "Also write CSV tables"))
        .arg(arg!(--"individual-files" "Write one text file per page, grouped by domain"));

    output_arg(seed_args(cmd))
}
