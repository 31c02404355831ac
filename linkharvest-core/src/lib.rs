pub mod analysis;
pub mod crawl;
pub mod csv;
pub mod error;
pub mod frontier;
pub mod output;
pub mod report;
pub mod search;
pub mod session;
pub mod settings;
pub mod sitemap_extract;
pub mod webhook;

use colored::Colorize;

pub use analysis::{KeywordCount, aggregate_keywords};
pub use crawl::{ActionCallback, Harvester, ProgressCallback};
pub use error::{CrawlError, Result};
pub use frontier::{Frontier, FrontierEntry};
pub use output::{ArtifactKind, DirectorySink, DownloadSink, MemorySink, ReportArtifact};
pub use session::{CrawlSession, CrawlState, FetchFailure};
pub use settings::{CrawlSettings, FilterMode, GoogleMode, LinkFilter, UrlFilter, UrlMode};
pub use sitemap_extract::{BaseSitemap, SitemapExtraction, SitemapValidation, validate_sitemaps};
pub use webhook::WebhookSummary;

pub fn print_banner() {
    let banner = r#"
  _     _       _    _   _                           _
 | |   (_)_ __ | | _| | | | __ _ _ ____   _____  ___| |_
 | |   | | '_ \| |/ / |_| |/ _` | '__\ \ / / _ \/ __| __|
 | |___| | | | |   <|  _  | (_| | |   \ V /  __/\__ \ |_
 |_____|_|_| |_|_|\_\_| |_|\__,_|_|    \_/ \___||___/\__|
"#;
    eprintln!("{}", banner.bright_green());
    eprintln!(
        "  {} {}\n",
        "breadth-first site harvester".dimmed(),
        concat!("v", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
