use colored::Colorize;
use linkharvest::commands::command_argument_builder;
use linkharvest::handlers::{handle_crawl, handle_sitemap_extract, handle_sitemap_validate};
use linkharvest_core::print_banner;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Logs go to stderr, progress to stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command).await,
        Some(("sitemap", primary_command)) => match primary_command.subcommand() {
            Some(("validate", secondary_command)) => handle_sitemap_validate(secondary_command).await,
            Some(("extract", secondary_command)) => handle_sitemap_extract(secondary_command).await,
            _ => unreachable!("clap should ensure we don't get here"),
        },
        // No subcommand provided, just show the banner
        _ => return,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
