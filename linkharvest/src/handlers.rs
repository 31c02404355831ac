use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use linkharvest_core::{
    CrawlSettings, DirectorySink, GoogleMode, Harvester, UrlFilter, UrlMode,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use url::Url;

// Helper functions for the harvest handlers

/// Seeds from `--url` values, else from a hosts file.
///
/// With `raw` set, lines are taken verbatim (search queries) instead of being
/// parsed as URLs.
pub fn load_urls_from_source(
    urls: &[String],
    hosts_file: Option<&PathBuf>,
    raw: bool,
) -> Result<Vec<String>> {
    if !urls.is_empty() {
        return Ok(urls.to_vec());
    }
    match hosts_file {
        Some(path) if raw => load_lines_from_file(path),
        Some(path) => load_urls_from_file(path),
        None => bail!("Either --url, --hosts-file or --settings must provide seeds"),
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let urls: Vec<String> = load_lines_from_file(path)?
        .iter()
        .filter_map(|line| parse_url_line(line))
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }
    Ok(urls)
}

fn load_lines_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Parse a single line as a URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("https://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some_and(|h| h.contains('.') || h == "localhost")
    {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

/// Expand `~` in an output directory argument.
pub fn resolve_output_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Assemble crawl settings from an optional JSON file plus command line flags.
pub fn build_settings(args: &ArgMatches) -> Result<CrawlSettings> {
    let mut settings = match args.get_one::<PathBuf>("settings") {
        Some(path) => CrawlSettings::from_json_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => CrawlSettings::default(),
    };

    if let Some(mode) = args.get_one::<String>("mode") {
        settings.url_mode = match mode.as_str() {
            "list" => UrlMode::List,
            "google" => UrlMode::Google,
            _ => UrlMode::Single,
        };
    }
    if let Some(mode) = args.get_one::<String>("google-mode") {
        settings.google_mode = match mode.as_str() {
            "current-page" => GoogleMode::CurrentPage,
            _ => GoogleMode::Queries,
        };
    }
    if let Some(depth) = args.get_one::<usize>("max-depth") {
        settings.max_depth = *depth;
    }
    if let Some(pages) = args.get_one::<usize>("max-pages") {
        settings.max_pages = *pages;
    }
    if let Some(delay) = args.get_one::<u64>("delay") {
        settings.delay_ms = *delay;
    }
    if let Some(text) = args.get_one::<String>("filter-contains") {
        settings.url_filter = UrlFilter::contains(text.clone());
    }
    if let Some(pattern) = args.get_one::<String>("filter-regex") {
        settings.url_filter = UrlFilter::regex(pattern.clone());
    }
    if let Some(webhook) = args.get_one::<String>("webhook") {
        settings.webhook_url = Some(webhook.clone());
    }

    let flags: [(&str, &mut bool); 7] = [
        ("html", &mut settings.extract_html),
        ("metadata", &mut settings.extract_metadata),
        ("sitemap", &mut settings.crawl_sitemap),
        ("keywords", &mut settings.keyword_density),
        ("broken-links", &mut settings.broken_link_checker),
        ("csv", &mut settings.csv_export),
        ("individual-files", &mut settings.save_individual_files),
    ];
    for (flag, field) in flags {
        if args.get_flag(flag) {
            *field = true;
        }
    }
    if args.get_flag("no-text") {
        settings.extract_text = false;
    }

    let cli_urls: Vec<String> = args
        .get_many::<String>("url")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let hosts_file = args.get_one::<PathBuf>("hosts-file");
    if !cli_urls.is_empty() || hosts_file.is_some() || settings.urls.is_empty() {
        let raw = settings.url_mode == UrlMode::Google && settings.google_mode == GoogleMode::Queries;
        settings.urls = load_urls_from_source(&cli_urls, hosts_file, raw)?;
    }

    settings.validate()?;
    debug!("Effective crawl settings: {:?}", settings);
    Ok(settings)
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Wire terminal progress, current action text and Ctrl-C into a harvester.
fn build_harvester(pb: &ProgressBar) -> Result<Harvester> {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.store(true, Ordering::Relaxed);
        }
    });

    let progress_pb = pb.clone();
    let action_pb = pb.clone();
    Ok(Harvester::new()?
        .with_cancel_flag(cancel)
        .with_progress_callback(Arc::new(move |processed: usize, total: usize, status: String| {
            progress_pb.set_length(total as u64);
            progress_pb.set_position(processed as u64);
            progress_pb.set_message(status);
        }))
        .with_action_callback(Arc::new(move |action: String| {
            action_pb.set_message(action);
        })))
}

fn print_settings_summary(settings: &CrawlSettings, output: &Path) {
    let mode = match settings.url_mode {
        UrlMode::Single => "single",
        UrlMode::List => "list",
        UrlMode::Google => "google",
    };
    println!(
        "\n{} Harvesting {} seed(s) in {} mode",
        "→".blue(),
        settings.urls.len().to_string().bright_white(),
        mode.bright_white()
    );
    println!(
        "  max depth {}, max pages {}, delay {}ms",
        settings.max_depth, settings.max_pages, settings.delay_ms
    );
    if let Some(filter) = settings.url_filter.describe() {
        println!("  filter: {}", filter);
    }
    println!("  output: {}\n", output.display().to_string().bright_white());
}

pub async fn handle_crawl(args: &ArgMatches) -> Result<()> {
    let settings = build_settings(args)?;
    let output = resolve_output_dir(
        args.get_one::<String>("output").map(String::as_str).unwrap_or("."),
    );
    print_settings_summary(&settings, &output);

    let pb = progress_bar();
    let harvester = build_harvester(&pb)?;
    let sink = DirectorySink::new(&output);

    let result = harvester.run_crawl(settings, &sink).await;
    pb.finish_and_clear();

    let session = result.context("Crawl failed")?;
    println!("{} Crawl complete!\n", "✓".green().bold());
    println!("  Pages harvested: {}", session.pages.len().to_string().cyan());
    println!("  Fetch failures:  {}", session.failures.len().to_string().cyan());
    if session.settings.broken_link_checker {
        println!(
            "  Broken links:    {}",
            session.broken_links.len().to_string().cyan()
        );
    }
    println!(
        "  Reports written to {}",
        output.display().to_string().bright_white()
    );
    Ok(())
}

fn seed_urls(args: &ArgMatches) -> Result<Vec<String>> {
    let urls: Vec<String> = args
        .get_many::<String>("url")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    load_urls_from_source(&urls, args.get_one::<PathBuf>("hosts-file"), false)
}

pub async fn handle_sitemap_validate(args: &ArgMatches) -> Result<()> {
    let urls = seed_urls(args)?;
    let harvester = Harvester::new()?;
    let validation = harvester.validate_sitemaps(&urls).await;

    for base in &validation.bases {
        match &base.sitemap_url {
            Some(sitemap) => println!(
                "{} {} → {} ({} URLs)",
                "✓".green().bold(),
                base.base_url.bright_white(),
                sitemap,
                base.urls.len().to_string().cyan()
            ),
            None => println!("{} {} → no sitemap found", "✗".red().bold(), base.base_url),
        }
    }
    println!(
        "\n{} of {} base URLs have a sitemap, {} URLs total",
        validation.valid_sitemaps,
        validation.bases.len(),
        validation.total_urls
    );
    Ok(())
}

pub async fn handle_sitemap_extract(args: &ArgMatches) -> Result<()> {
    let mut settings = CrawlSettings::new(seed_urls(args)?);
    settings.max_pages = args.get_one::<usize>("max-pages").copied().unwrap_or(50);
    settings.delay_ms = args.get_one::<u64>("delay").copied().unwrap_or(0);
    settings.extract_metadata = args.get_flag("metadata");
    settings.extract_text = !args.get_flag("no-text");
    settings.broken_link_checker = args.get_flag("broken-links");

    let output = resolve_output_dir(
        args.get_one::<String>("output").map(String::as_str).unwrap_or("."),
    );
    let pb = progress_bar();
    let harvester = build_harvester(&pb)?;
    let sink = DirectorySink::new(&output);

    let result = harvester.extract_sitemap_content(settings, &sink).await;
    pb.finish_and_clear();

    let extraction = result.context("Sitemap extraction failed")?;
    println!(
        "{} Extracted {} of {} pages into {}",
        "✓".green().bold(),
        extraction.pages.len().to_string().cyan(),
        extraction.processed,
        output.display().to_string().bright_white()
    );
    if !extraction.broken_links.is_empty() {
        println!(
            "  Broken links:    {}",
            extraction.broken_links.len().to_string().cyan()
        );
    }
    Ok(())
}
